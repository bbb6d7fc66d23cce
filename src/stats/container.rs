use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::stats::{CountingDistribution, DistributionError, DistributionKind};

/// Errors raised by [`StatsContainer`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// The key was not part of the prepared key set.
    #[error("statistic {0} was not prepared for this track")]
    UnknownKey(StatKey),

    /// Distribution merge failed.
    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

/// Named per-track statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    /// Mappings of the track.
    NoMappings,
    /// Mappings of reads with a single mapping position.
    NoUniqueMappings,
    /// Mappings without mismatches.
    NoPerfectMappings,
    /// Mappings with the fewest mismatches of their read.
    NoBestMatchMappings,
    /// Mappings of any class.
    NoCommonMappings,
    /// Mapped reads.
    NoReads,
    /// Read sequences occurring once.
    NoUniqueSeqs,
    /// Read sequences occurring more than once.
    NoRepeatedSeqs,
    /// Reference bases covered by perfect mappings.
    CoveredBasesPerfect,
    /// Reference bases covered by perfect or best match mappings.
    CoveredBasesBestMatch,
    /// Reference bases covered by any mapping.
    CoveredBasesCommon,
    /// Truncated mean read length.
    AverageReadLength,
    /// Read pairs with both mates mapped.
    NoSeqPairs,
    /// Pairs with expected orientation and distance.
    NoPerfectSeqPairs,
    /// Pairs with a single mapping position.
    NoUniqueSeqPairs,
    /// Perfect pairs with a single mapping position.
    NoUniquePerfectSeqPairs,
    /// Mappings whose mate is unmapped or unpaired.
    NoSingleMappings,
    /// Pairs closer than the expected distance.
    NoSmallDistPairs,
    /// Pairs further apart than the expected distance.
    NoLargeDistPairs,
    /// Pairs with unexpected mate orientation.
    NoOrientWrongPairs,
    /// Truncated mean pair size.
    AverageSeqPairLength,
}

impl StatKey {
    /// Keys of every track.
    pub const SINGLE_END: [StatKey; 12] = [
        StatKey::NoMappings,
        StatKey::NoUniqueMappings,
        StatKey::NoPerfectMappings,
        StatKey::NoBestMatchMappings,
        StatKey::NoCommonMappings,
        StatKey::NoReads,
        StatKey::NoUniqueSeqs,
        StatKey::NoRepeatedSeqs,
        StatKey::CoveredBasesPerfect,
        StatKey::CoveredBasesBestMatch,
        StatKey::CoveredBasesCommon,
        StatKey::AverageReadLength,
    ];

    /// Additional keys of read pair tracks.
    pub const READ_PAIR: [StatKey; 9] = [
        StatKey::NoSeqPairs,
        StatKey::NoPerfectSeqPairs,
        StatKey::NoUniqueSeqPairs,
        StatKey::NoUniquePerfectSeqPairs,
        StatKey::NoSingleMappings,
        StatKey::NoSmallDistPairs,
        StatKey::NoLargeDistPairs,
        StatKey::NoOrientWrongPairs,
        StatKey::AverageSeqPairLength,
    ];

    /// Stable persisted name.
    pub fn name(self) -> &'static str {
        match self {
            StatKey::NoMappings => "NUM_MAPPINGS",
            StatKey::NoUniqueMappings => "NUM_UNIQUE_MAPPINGS",
            StatKey::NoPerfectMappings => "NUM_PERFECT_MAPPINGS",
            StatKey::NoBestMatchMappings => "NUM_BM_MAPPINGS",
            StatKey::NoCommonMappings => "NUM_COMMON_MAPPINGS",
            StatKey::NoReads => "NUM_READS",
            StatKey::NoUniqueSeqs => "NUM_UNIQUE_SEQS",
            StatKey::NoRepeatedSeqs => "NUM_REPEATED_SEQS",
            StatKey::CoveredBasesPerfect => "COVERED_PERFECT_BASES",
            StatKey::CoveredBasesBestMatch => "COVERED_BM_BASES",
            StatKey::CoveredBasesCommon => "COVERED_COMMON_BASES",
            StatKey::AverageReadLength => "AVERAGE_READ_LENGTH",
            StatKey::NoSeqPairs => "NUM_SEQ_PAIRS",
            StatKey::NoPerfectSeqPairs => "NUM_PERFECT_SEQ_PAIRS",
            StatKey::NoUniqueSeqPairs => "NUM_UNIQUE_SEQ_PAIRS",
            StatKey::NoUniquePerfectSeqPairs => "NUM_UNIQUE_PERFECT_SEQ_PAIRS",
            StatKey::NoSingleMappings => "NUM_SINGLE_MAPPINGS",
            StatKey::NoSmallDistPairs => "NUM_SMALL_DIST_PAIRS",
            StatKey::NoLargeDistPairs => "NUM_LARGE_DIST_PAIRS",
            StatKey::NoOrientWrongPairs => "NUM_ORIENT_WRONG_PAIRS",
            StatKey::AverageSeqPairLength => "AVERAGE_SEQ_PAIR_LENGTH",
        }
    }

    /// Key for a persisted name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SINGLE_END
            .into_iter()
            .chain(Self::READ_PAIR)
            .find(|key| key.name() == name)
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-track statistics: a fixed set of monotonic counters plus the track's
/// counting distributions.
///
/// Only prepared keys may be increased, which keeps the persisted schema stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsContainer {
    values: BTreeMap<StatKey, u64>,
    distributions: BTreeMap<DistributionKind, CountingDistribution>,
    read_pairs: bool,
}

impl StatsContainer {
    /// Empty container; call one of the `prepare_*` methods before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialise the single-end key set to zero.
    pub fn prepare_for_track(&mut self) {
        for key in StatKey::SINGLE_END {
            self.values.entry(key).or_insert(0);
        }
        for kind in [
            DistributionKind::ReadLength,
            DistributionKind::CoverageIncrease,
            DistributionKind::CoverageIncreasePercent,
        ] {
            self.distributions
                .entry(kind)
                .or_insert_with(|| CountingDistribution::new(kind));
        }
    }

    /// Initialise the single-end and read pair key sets to zero.
    pub fn prepare_for_read_pair_track(&mut self) {
        self.prepare_for_track();
        for key in StatKey::READ_PAIR {
            self.values.entry(key).or_insert(0);
        }
        self.distributions
            .entry(DistributionKind::ReadPairSize)
            .or_insert_with(|| CountingDistribution::new(DistributionKind::ReadPairSize));
        self.read_pairs = true;
    }

    /// Whether the read pair key set was prepared.
    pub fn is_read_pair_track(&self) -> bool {
        self.read_pairs
    }

    /// Add `delta` to a prepared key.
    pub fn increase_value(&mut self, key: StatKey, delta: u64) -> Result<(), StatsError> {
        let value = self.values.get_mut(&key).ok_or(StatsError::UnknownKey(key))?;
        *value += delta;
        Ok(())
    }

    /// Current value of a key, `None` if not prepared.
    pub fn value(&self, key: StatKey) -> Option<u64> {
        self.values.get(&key).copied()
    }

    /// Prepared keys with their values, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (StatKey, u64)> + '_ {
        self.values.iter().map(|(key, value)| (*key, *value))
    }

    /// Number of prepared keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key was prepared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distribution of the given kind, if prepared.
    pub fn distribution(&self, kind: DistributionKind) -> Option<&CountingDistribution> {
        self.distributions.get(&kind)
    }

    /// Mutable distribution of the given kind, if prepared.
    pub fn distribution_mut(&mut self, kind: DistributionKind) -> Option<&mut CountingDistribution> {
        self.distributions.get_mut(&kind)
    }

    /// Prepared distributions, in kind order.
    pub fn distributions(&self) -> impl Iterator<Item = &CountingDistribution> + '_ {
        self.distributions.values()
    }

    /// Add another container's values and distributions.
    ///
    /// Every key and distribution of `other` must be prepared here. Nothing is
    /// applied when that check fails.
    pub fn merge(&mut self, other: &Self) -> Result<(), StatsError> {
        if let Some(key) = other.values.keys().find(|key| !self.values.contains_key(key)) {
            return Err(StatsError::UnknownKey(*key));
        }
        let mut merged = self.distributions.clone();
        for (kind, distribution) in &other.distributions {
            match merged.get_mut(kind) {
                Some(own) => own.merge(distribution)?,
                None => {
                    merged.insert(*kind, distribution.clone());
                }
            }
        }

        for (key, value) in &other.values {
            if let Some(own) = self.values.get_mut(key) {
                *own += value;
            }
        }
        self.distributions = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_key_sets() {
        let mut single = StatsContainer::new();
        single.prepare_for_track();
        assert_eq!(single.len(), StatKey::SINGLE_END.len());
        assert_eq!(single.value(StatKey::NoMappings), Some(0));
        assert_eq!(single.value(StatKey::NoSeqPairs), None);
        assert!(single.distribution(DistributionKind::ReadPairSize).is_none());

        let mut paired = StatsContainer::new();
        paired.prepare_for_read_pair_track();
        assert!(paired.is_read_pair_track());
        assert_eq!(paired.len(), StatKey::SINGLE_END.len() + StatKey::READ_PAIR.len());
        assert_eq!(paired.distributions().count(), 4);
    }

    #[test]
    fn increase_requires_prepared_key() {
        let mut stats = StatsContainer::new();
        stats.prepare_for_track();
        stats.increase_value(StatKey::NoReads, 3).unwrap();
        stats.increase_value(StatKey::NoReads, 2).unwrap();
        assert_eq!(stats.value(StatKey::NoReads), Some(5));
        assert_eq!(
            stats.increase_value(StatKey::NoSeqPairs, 1),
            Err(StatsError::UnknownKey(StatKey::NoSeqPairs))
        );
    }

    #[test]
    fn merge_sums_values_and_bins() {
        let mut left = StatsContainer::new();
        left.prepare_for_track();
        left.increase_value(StatKey::NoMappings, 4).unwrap();
        left.distribution_mut(DistributionKind::ReadLength)
            .unwrap()
            .insert(100);

        let mut right = left.clone();
        right.increase_value(StatKey::NoMappings, 1).unwrap();
        left.merge(&right).unwrap();

        assert_eq!(left.value(StatKey::NoMappings), Some(9));
        assert_eq!(
            left.distribution(DistributionKind::ReadLength).unwrap().total_count(),
            2
        );
    }

    #[test]
    fn merge_rejects_unprepared_keys_without_applying() {
        let mut single = StatsContainer::new();
        single.prepare_for_track();
        let mut paired = StatsContainer::new();
        paired.prepare_for_read_pair_track();
        paired.increase_value(StatKey::NoMappings, 1).unwrap();

        assert!(single.merge(&paired).is_err());
        assert_eq!(single.value(StatKey::NoMappings), Some(0));
    }

    #[test]
    fn persisted_names_round_trip() {
        for key in StatKey::SINGLE_END.into_iter().chain(StatKey::READ_PAIR) {
            assert_eq!(StatKey::from_name(key.name()), Some(key));
        }
    }
}
