use proptest::prelude::*;
use vartrack::genomics::ReadClass;
use vartrack::stats::{MappingInfo, PairInfo, PairType, StatKey, StatsCollector, StatsContainer};
use vartrack::MemoryStore;

fn mapping() -> impl Strategy<Value = MappingInfo> {
    (1u32..2_000, 0usize..ReadClass::COUNT, any::<bool>(), any::<bool>()).prop_map(
        |(length, class, first_of_read, repeated_sequence)| MappingInfo {
            length,
            class: ReadClass::ALL[class],
            first_of_read,
            repeated_sequence,
        },
    )
}

fn pair() -> impl Strategy<Value = PairInfo> {
    (
        prop_oneof![
            Just(PairType::Perfect),
            Just(PairType::SmallDistance),
            Just(PairType::LargeDistance),
            Just(PairType::WrongOrientation),
            Just(PairType::Unpaired),
        ],
        0u32..5_000,
        any::<bool>(),
    )
        .prop_map(|(pair_type, size, unique)| PairInfo {
            pair_type,
            size,
            unique,
        })
}

fn collect(mappings: &[MappingInfo], pairs: &[PairInfo]) -> StatsContainer {
    let mut collector = StatsCollector::for_read_pairs(1);
    for mapping in mappings {
        collector.observe_mapping(mapping).unwrap();
    }
    for pair in pairs {
        collector.observe_pair(pair).unwrap();
    }
    collector.finish(&mut MemoryStore::new()).unwrap()
}

proptest! {
    #[test]
    fn observation_order_does_not_matter(
        mappings in proptest::collection::vec(mapping(), 0..48),
        pairs in proptest::collection::vec(pair(), 0..48),
        rotation in 0usize..48,
    ) {
        let forward = collect(&mappings, &pairs);

        let mut shuffled_mappings = mappings.clone();
        shuffled_mappings.reverse();
        let mut shuffled_pairs = pairs.clone();
        if !shuffled_pairs.is_empty() {
            let by = rotation % shuffled_pairs.len();
            shuffled_pairs.rotate_left(by);
        }
        let shuffled = collect(&shuffled_mappings, &shuffled_pairs);

        prop_assert_eq!(forward, shuffled);
    }

    #[test]
    fn merged_halves_equal_the_whole(
        mappings in proptest::collection::vec(mapping(), 0..48),
        split in 0usize..48,
    ) {
        let split = split.min(mappings.len());
        let (left, right) = mappings.split_at(split);

        let mut lhs = StatsCollector::for_read_pairs(1);
        for mapping in left {
            lhs.observe_mapping(mapping).unwrap();
        }
        let mut rhs = StatsCollector::for_read_pairs(1);
        for mapping in right {
            rhs.observe_mapping(mapping).unwrap();
        }
        let mut whole = StatsCollector::for_read_pairs(1);
        for mapping in &mappings {
            whole.observe_mapping(mapping).unwrap();
        }

        let mut merged = lhs.stats().clone();
        merged.merge(rhs.stats()).unwrap();
        prop_assert_eq!(&merged, whole.stats());

        let reads = mappings.iter().filter(|mapping| mapping.first_of_read).count() as u64;
        prop_assert_eq!(merged.value(StatKey::NoReads), Some(reads));
        prop_assert_eq!(merged.value(StatKey::NoMappings), Some(mappings.len() as u64));
    }
}

#[test]
fn single_end_container_rejects_read_pair_keys() {
    let mut single = StatsContainer::new();
    single.prepare_for_track();
    let mut paired = StatsContainer::new();
    paired.prepare_for_read_pair_track();
    paired.increase_value(StatKey::NoSeqPairs, 3).unwrap();

    let before = single.clone();
    assert!(single.merge(&paired).is_err());
    assert_eq!(single, before);
}


