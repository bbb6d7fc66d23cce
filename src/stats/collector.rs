use tracing::{debug, error, info, warn};

use crate::analysis::{BatchObserver, CoverageBatch};
use crate::genomics::{CoverageManager, ReadClass, ReadClassFilter, Strand};
use crate::stats::{DistributionKind, StatKey, StatsContainer};
use crate::store::{StatsStore, StoreError};
use crate::AnalysisError;

/// One mapping of a read, as reported by the alignment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingInfo {
    /// Mapped read length.
    pub length: u32,
    /// Mapping classification.
    pub class: ReadClass,
    /// First reported mapping of its read.
    pub first_of_read: bool,
    /// The read's sequence occurs more than once in the data set.
    pub repeated_sequence: bool,
}

/// Relation of two mates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairType {
    /// Expected orientation and distance.
    Perfect,
    /// Mates closer than expected.
    SmallDistance,
    /// Mates further apart than expected.
    LargeDistance,
    /// Unexpected mate orientation.
    WrongOrientation,
    /// Mapping without a mapped mate.
    Unpaired,
}

/// One read pair, as reported by the alignment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairInfo {
    /// Mate relation.
    pub pair_type: PairType,
    /// Span from the first to the last mate base.
    pub size: u32,
    /// The pair has a single mapping position.
    pub unique: bool,
}

/// Per-track statistics gathered from the batch stream and mapping reports.
#[derive(Debug)]
pub struct StatsCollector {
    track_id: u32,
    stats: StatsContainer,
    filter: ReadClassFilter,
    previous_forward: Option<(u32, u32, u32)>,
    windows: u64,
}

impl StatsCollector {
    /// Collector for a single-end track.
    pub fn new(track_id: u32) -> Self {
        let mut stats = StatsContainer::new();
        stats.prepare_for_track();
        Self {
            track_id,
            stats,
            filter: ReadClassFilter::all(),
            previous_forward: None,
            windows: 0,
        }
    }

    /// Collector for a read pair track.
    pub fn for_read_pairs(track_id: u32) -> Self {
        let mut collector = Self::new(track_id);
        collector.stats.prepare_for_read_pair_track();
        collector
    }

    /// Restrict coverage-increase statistics to the given read classes.
    pub fn with_read_classes(mut self, filter: ReadClassFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Track the collector belongs to.
    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Statistics gathered so far.
    pub fn stats(&self) -> &StatsContainer {
        &self.stats
    }

    /// Count one mapping.
    pub fn observe_mapping(&mut self, mapping: &MappingInfo) -> Result<(), AnalysisError> {
        let stats = &mut self.stats;
        stats.increase_value(StatKey::NoMappings, 1)?;
        stats.increase_value(StatKey::NoCommonMappings, 1)?;
        if mapping.class.is_unique() {
            stats.increase_value(StatKey::NoUniqueMappings, 1)?;
        }
        if mapping.class.is_perfect() {
            stats.increase_value(StatKey::NoPerfectMappings, 1)?;
        }
        if mapping.class.is_best_match() {
            stats.increase_value(StatKey::NoBestMatchMappings, 1)?;
        }
        if mapping.first_of_read {
            stats.increase_value(StatKey::NoReads, 1)?;
            let sequence_key = if mapping.repeated_sequence {
                StatKey::NoRepeatedSeqs
            } else {
                StatKey::NoUniqueSeqs
            };
            stats.increase_value(sequence_key, 1)?;
            if let Some(lengths) = stats.distribution_mut(DistributionKind::ReadLength) {
                lengths.insert(mapping.length);
            }
        }
        Ok(())
    }

    /// Count one read pair. Requires a read pair collector.
    pub fn observe_pair(&mut self, pair: &PairInfo) -> Result<(), AnalysisError> {
        let stats = &mut self.stats;
        if pair.pair_type == PairType::Unpaired {
            stats.increase_value(StatKey::NoSingleMappings, 1)?;
            return Ok(());
        }

        stats.increase_value(StatKey::NoSeqPairs, 1)?;
        if pair.unique {
            stats.increase_value(StatKey::NoUniqueSeqPairs, 1)?;
        }
        match pair.pair_type {
            PairType::Perfect => {
                stats.increase_value(StatKey::NoPerfectSeqPairs, 1)?;
                if pair.unique {
                    stats.increase_value(StatKey::NoUniquePerfectSeqPairs, 1)?;
                }
            }
            PairType::SmallDistance => stats.increase_value(StatKey::NoSmallDistPairs, 1)?,
            PairType::LargeDistance => stats.increase_value(StatKey::NoLargeDistPairs, 1)?,
            PairType::WrongOrientation => stats.increase_value(StatKey::NoOrientWrongPairs, 1)?,
            PairType::Unpaired => {}
        }
        if let Some(sizes) = stats.distribution_mut(DistributionKind::ReadPairSize) {
            sizes.insert(pair.size);
        }
        Ok(())
    }

    /// Write averages, then persist the statistics and every non-empty
    /// distribution in one store transaction.
    ///
    /// A failing write rolls the whole track back before the error is
    /// returned, so the store never holds a partial set of rows.
    pub fn finish<S: StatsStore + ?Sized>(
        mut self,
        store: &mut S,
    ) -> Result<StatsContainer, AnalysisError> {
        self.write_averages()?;
        store.begin_track(self.track_id)?;
        if let Err(err) = self.persist(store) {
            warn!(track_id = self.track_id, %err, "storing track statistics failed, rolling back");
            if let Err(rollback) = store.rollback_track(self.track_id) {
                error!(track_id = self.track_id, %rollback, "rollback of track statistics failed");
            }
            return Err(err.into());
        }
        info!(
            track_id = self.track_id,
            windows = self.windows,
            mappings = self.stats.value(StatKey::NoMappings).unwrap_or(0),
            "track statistics stored"
        );
        Ok(self.stats)
    }

    fn persist<S: StatsStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        store.store_track_statistics(&self.stats, self.track_id)?;
        for distribution in self.stats.distributions() {
            if distribution.is_empty() {
                continue;
            }
            store.insert_count_distribution(distribution, self.track_id)?;
        }
        store.commit_track(self.track_id)
    }

    fn write_averages(&mut self) -> Result<(), AnalysisError> {
        let averages = [
            (DistributionKind::ReadLength, StatKey::AverageReadLength),
            (DistributionKind::ReadPairSize, StatKey::AverageSeqPairLength),
        ];
        for (kind, key) in averages {
            let average = match self.stats.distribution(kind) {
                Some(distribution) => distribution.average_value(),
                None => continue,
            };
            self.stats.increase_value(key, average)?;
        }
        Ok(())
    }

    fn count_covered_bases(&mut self, coverage: &CoverageManager) -> Result<(), AnalysisError> {
        let (mut perfect, mut best_match, mut common) = (0u64, 0u64, 0u64);
        for position in coverage.left_bound()..=coverage.right_bound() {
            let covered_by = |accept: fn(ReadClass) -> bool| {
                ReadClass::ALL.iter().any(|class| {
                    accept(*class)
                        && (coverage.coverage(position, *class, Strand::Forward) > 0
                            || coverage.coverage(position, *class, Strand::Reverse) > 0)
                })
            };
            if covered_by(ReadClass::is_perfect) {
                perfect += 1;
            }
            if covered_by(ReadClass::is_best_match) {
                best_match += 1;
            }
            if covered_by(|_| true) {
                common += 1;
            }
        }
        self.stats.increase_value(StatKey::CoveredBasesPerfect, perfect)?;
        self.stats.increase_value(StatKey::CoveredBasesBestMatch, best_match)?;
        self.stats.increase_value(StatKey::CoveredBasesCommon, common)?;
        Ok(())
    }

    fn record_coverage_increases(&mut self, chrom_id: u32, coverage: &CoverageManager) {
        // carry the last position over when windows are contiguous
        let mut previous = match self.previous_forward {
            Some((chrom, position, value))
                if chrom == chrom_id && position + 1 == coverage.left_bound() =>
            {
                Some(value)
            }
            _ => None,
        };

        for position in coverage.left_bound()..=coverage.right_bound() {
            let current = coverage.forward_coverage(position, &self.filter);
            if let Some(before) = previous {
                if current > before {
                    let increase = current - before;
                    if let Some(absolute) =
                        self.stats.distribution_mut(DistributionKind::CoverageIncrease)
                    {
                        absolute.insert(increase);
                    }
                    if before > 0 {
                        let percent = (increase as u64 * 100 / before as u64) as u32;
                        if let Some(relative) =
                            self.stats.distribution_mut(DistributionKind::CoverageIncreasePercent)
                        {
                            relative.insert(percent);
                        }
                    }
                }
            }
            previous = Some(current);
        }

        self.previous_forward =
            previous.map(|value| (chrom_id, coverage.right_bound(), value));
    }
}

impl BatchObserver for StatsCollector {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn on_batch(&mut self, batch: &CoverageBatch) -> Result<(), AnalysisError> {
        if batch.request.track_id != self.track_id {
            return Ok(());
        }
        self.count_covered_bases(&batch.coverage)?;
        self.record_coverage_increases(batch.request.chrom_id, &batch.coverage);
        self.windows += 1;
        debug!(
            track_id = self.track_id,
            window = %format_args!("{}..={}", batch.request.from, batch.request.to),
            "coverage statistics updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IntervalRequest;
    use crate::store::MemoryStore;

    fn batch(track_id: u32, from: u32, to: u32, depths: &[(u32, ReadClass, u32)]) -> CoverageBatch {
        let mut coverage = CoverageManager::new(from, to);
        for &(position, class, depth) in depths {
            coverage.add(position, class, Strand::Forward, depth);
        }
        CoverageBatch {
            request: IntervalRequest {
                track_id,
                chrom_id: 1,
                from,
                to,
            },
            coverage,
            diffs: Vec::new(),
            gaps: Vec::new(),
        }
    }

    #[test]
    fn covered_bases_by_class_group() {
        let mut collector = StatsCollector::new(1);
        collector
            .on_batch(&batch(
                1,
                1,
                4,
                &[
                    (1, ReadClass::SinglePerfectMatch, 2),
                    (2, ReadClass::BestMatch, 1),
                    (3, ReadClass::CommonMatch, 1),
                ],
            ))
            .unwrap();
        let stats = collector.stats();
        assert_eq!(stats.value(StatKey::CoveredBasesPerfect), Some(1));
        assert_eq!(stats.value(StatKey::CoveredBasesBestMatch), Some(2));
        assert_eq!(stats.value(StatKey::CoveredBasesCommon), Some(3));
    }

    #[test]
    fn coverage_increases_span_contiguous_windows() {
        let mut collector = StatsCollector::new(1);
        collector
            .on_batch(&batch(
                1,
                1,
                3,
                &[(2, ReadClass::CommonMatch, 2), (3, ReadClass::CommonMatch, 4)],
            ))
            .unwrap();
        collector
            .on_batch(&batch(1, 4, 4, &[(4, ReadClass::CommonMatch, 5)]))
            .unwrap();

        let absolute = collector
            .stats()
            .distribution(DistributionKind::CoverageIncrease)
            .unwrap();
        // 0 -> 2 has no percentage, 2 -> 4 is 100 %, 4 -> 5 is 25 %
        assert_eq!(absolute.total_count(), 3);
        let relative = collector
            .stats()
            .distribution(DistributionKind::CoverageIncreasePercent)
            .unwrap();
        assert_eq!(relative.total_count(), 2);
        assert_eq!(relative.average_value(), 62);
    }

    #[test]
    fn mapping_and_pair_counters() {
        let mut collector = StatsCollector::for_read_pairs(2);
        for (class, first) in [
            (ReadClass::SinglePerfectMatch, true),
            (ReadClass::BestMatch, false),
            (ReadClass::CommonMatch, true),
        ] {
            collector
                .observe_mapping(&MappingInfo {
                    length: 100,
                    class,
                    first_of_read: first,
                    repeated_sequence: !first,
                })
                .unwrap();
        }
        collector
            .observe_pair(&PairInfo {
                pair_type: PairType::Perfect,
                size: 300,
                unique: true,
            })
            .unwrap();
        collector
            .observe_pair(&PairInfo {
                pair_type: PairType::Unpaired,
                size: 0,
                unique: false,
            })
            .unwrap();

        let stats = collector.stats();
        assert_eq!(stats.value(StatKey::NoMappings), Some(3));
        assert_eq!(stats.value(StatKey::NoUniqueMappings), Some(1));
        assert_eq!(stats.value(StatKey::NoPerfectMappings), Some(1));
        assert_eq!(stats.value(StatKey::NoBestMatchMappings), Some(2));
        assert_eq!(stats.value(StatKey::NoReads), Some(2));
        assert_eq!(stats.value(StatKey::NoUniquePerfectSeqPairs), Some(1));
        assert_eq!(stats.value(StatKey::NoSingleMappings), Some(1));
        assert_eq!(stats.value(StatKey::NoSeqPairs), Some(1));
    }

    #[test]
    fn single_end_collector_rejects_pairs() {
        let mut collector = StatsCollector::new(1);
        let err = collector
            .observe_pair(&PairInfo {
                pair_type: PairType::Perfect,
                size: 10,
                unique: false,
            })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Stats(_)));
    }

    #[test]
    fn finish_persists_averages_and_distributions() {
        let mut collector = StatsCollector::new(3);
        for length in [10, 20, 30] {
            collector
                .observe_mapping(&MappingInfo {
                    length,
                    class: ReadClass::SinglePerfectMatch,
                    first_of_read: true,
                    repeated_sequence: false,
                })
                .unwrap();
        }
        let mut store = MemoryStore::new();
        let stats = collector.finish(&mut store).unwrap();

        assert_eq!(stats.value(StatKey::AverageReadLength), Some(20));
        assert_eq!(store.statistic(3, "AVERAGE_READ_LENGTH"), Some(20));
        let length_id = DistributionKind::ReadLength.id();
        assert_eq!(store.distribution_bins(3, length_id).map(|bins| bins.len()), Some(101));
        assert!(store
            .distribution_bins(3, DistributionKind::CoverageIncrease.id())
            .is_none());
    }

    #[test]
    fn failed_persistence_is_surfaced() {
        let collector = StatsCollector::new(3);
        let mut store = MemoryStore::new();
        store.set_read_only(true);
        let err = collector.finish(&mut store).unwrap_err();
        assert!(matches!(err, AnalysisError::Storage(StoreError::ReadOnly)));
    }

    #[test]
    fn failed_distribution_write_rolls_back_the_track() {
        let mut collector = StatsCollector::new(4);
        collector
            .observe_mapping(&MappingInfo {
                length: 50,
                class: ReadClass::PerfectMatch,
                first_of_read: true,
                repeated_sequence: false,
            })
            .unwrap();
        let mut store = MemoryStore::new();
        store.fail_next_distribution_writes(1);

        let err = collector.finish(&mut store).unwrap_err();
        assert!(matches!(err, AnalysisError::Storage(StoreError::Unavailable(_))));
        assert_eq!(store.statistic_rows(4), 0);
        assert!(store
            .distribution_bins(4, DistributionKind::ReadLength.id())
            .is_none());

        // the store accepts the next attempt
        let retry = StatsCollector::new(4);
        retry.finish(&mut store).unwrap();
        assert_eq!(store.statistic_rows(4), StatKey::SINGLE_END.len());
    }
}
