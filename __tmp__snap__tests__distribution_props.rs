use proptest::prelude::*;
use vartrack::stats::{
    CountingDistribution, DistributionError, DistributionKind, DEFAULT_BIN_STEPS, NUM_BINS,
};

proptest! {
    #[test]
    fn borders_increase_and_tile_the_range(adjustment in 100u32..100_000) {
        let dist = CountingDistribution::with_schedule(
            DistributionKind::ReadLength,
            DEFAULT_BIN_STEPS,
            adjustment,
        );
        let lower = dist.lower_borders();
        let upper = dist.upper_borders();
        prop_assert_eq!(lower.len(), NUM_BINS);
        prop_assert_eq!(lower[0], 0);
        prop_assert_eq!(upper[NUM_BINS - 1], u32::MAX);

        for idx in 1..NUM_BINS {
            prop_assert!(lower[idx] > lower[idx - 1], "borders must strictly increase");
            prop_assert_eq!(upper[idx - 1] + 1, lower[idx], "bins must not overlap or leave holes");
        }
    }

    #[test]
    fn inserted_values_land_within_their_bin(
        adjustment in 100u32..10_000,
        values in proptest::collection::vec(any::<u32>(), 1..64),
    ) {
        let mut dist = CountingDistribution::with_schedule(
            DistributionKind::CoverageIncrease,
            DEFAULT_BIN_STEPS,
            adjustment,
        );
        for &value in &values {
            let idx = dist.bin_index(value);
            prop_assert!(dist.lower_borders()[idx] <= value);
            prop_assert!(value <= dist.upper_borders()[idx]);
            dist.insert(value);
        }

        prop_assert_eq!(dist.total_count(), values.len() as u64);
        prop_assert_eq!(dist.discrete_counts().iter().sum::<u64>(), values.len() as u64);
        prop_assert_eq!(dist.min_value(), values.iter().copied().min());
        prop_assert_eq!(dist.max_value(), values.iter().copied().max());
        let mean = values.iter().map(|&v| v as u64).sum::<u64>() / values.len() as u64;
        prop_assert_eq!(dist.average_value(), mean);
    }

    #[test]
    fn restored_bins_keep_the_total_consistent(
        counts in proptest::collection::vec((0usize..NUM_BINS, 0u64..1_000), 0..32),
    ) {
        let mut dist = CountingDistribution::new(DistributionKind::ReadPairSize);
        let mut expected = vec![0u64; NUM_BINS];
        for &(idx, count) in &counts {
            dist.set_count_for_index(idx, count).unwrap();
            expected[idx] = count;
        }
        prop_assert_eq!(dist.discrete_counts(), expected.as_slice());
        prop_assert_eq!(dist.total_count(), expected.iter().sum::<u64>());
    }

    #[test]
    fn merging_equals_inserting_everything(
        left in proptest::collection::vec(0u32..20_000, 0..32),
        right in proptest::collection::vec(0u32..20_000, 0..32),
    ) {
        let mut merged = CountingDistribution::new(DistributionKind::ReadLength);
        let mut other = CountingDistribution::new(DistributionKind::ReadLength);
        let mut direct = CountingDistribution::new(DistributionKind::ReadLength);
        for &value in &left {
            merged.insert(value);
            direct.insert(value);
        }
        for &value in &right {
            other.insert(value);
            direct.insert(value);
        }
        merged.merge(&other).unwrap();

        prop_assert_eq!(merged.discrete_counts(), direct.discrete_counts());
        prop_assert_eq!(merged.average_value(), direct.average_value());
        prop_assert_eq!(merged.min_value(), direct.min_value());
    }
}

#[test]
fn out_of_range_bins_are_rejected() {
    let mut dist = CountingDistribution::new(DistributionKind::ReadLength);
    assert_eq!(
        dist.set_count_for_index(NUM_BINS, 1),
        Err(DistributionError::IndexOutOfRange {
            index: NUM_BINS,
            bins: NUM_BINS,
        })
    );
    assert!(dist.is_empty());
}

#[test]
fn different_schedules_do_not_merge() {
    let mut coarse = CountingDistribution::new(DistributionKind::ReadLength);
    let fine =
        CountingDistribution::with_schedule(DistributionKind::ReadLength, DEFAULT_BIN_STEPS, 100);
    assert!(matches!(
        coarse.merge(&fine),
        Err(DistributionError::BorderMismatch { .. })
    ));
}


