use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::genomics::{FeatureRecord, FeatureType};
use crate::stats::{CountingDistribution, DistributionKind, StatsContainer};
use crate::store::{check_range, overlapping, ReferenceStore, StatsStore, StoreError};

#[derive(Debug, Clone)]
struct Chromosome {
    name: String,
    sequence: Vec<u8>,
    features: Vec<FeatureRecord>,
}

type StatisticRows = BTreeMap<(u32, &'static str), u64>;
type DistributionRows = BTreeMap<(u32, u8), Vec<u64>>;

/// Tables as they will look once the open transaction commits.
#[derive(Debug, Clone)]
struct Transaction {
    track_id: u32,
    statistics: StatisticRows,
    distributions: DistributionRows,
}

/// In-memory reference and statistics store.
///
/// Statistics writes are staged on a copy of the tables and committed only
/// when every row was written, or at [`StatsStore::commit_track`] inside a
/// transaction. [`MemoryStore::set_read_only`],
/// [`MemoryStore::fail_next_sequence_reads`] and
/// [`MemoryStore::fail_next_distribution_writes`] simulate failing backends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chromosomes: HashMap<u32, Chromosome>,
    statistics: StatisticRows,
    distributions: DistributionRows,
    transaction: Option<Transaction>,
    read_only: bool,
    failing_reads: AtomicUsize,
    failing_distribution_writes: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chromosome with its sequence.
    pub fn with_chromosome(mut self, chrom_id: u32, name: &str, sequence: &[u8]) -> Self {
        self.chromosomes.insert(
            chrom_id,
            Chromosome {
                name: name.to_string(),
                sequence: sequence.to_ascii_uppercase(),
                features: Vec::new(),
            },
        );
        self
    }

    /// Attach features to the chromosomes they name; unknown chromosomes are ignored.
    pub fn with_features(mut self, features: Vec<FeatureRecord>) -> Self {
        for feature in features {
            if let Some(chromosome) = self.chromosomes.get_mut(&feature.chrom_id) {
                chromosome.features.push(feature);
            }
        }
        self
    }

    /// Reject every statistics write while enabled.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Make the next `count` sequence reads fail with [`StoreError::Unavailable`].
    pub fn fail_next_sequence_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` distribution writes fail with [`StoreError::Unavailable`].
    pub fn fail_next_distribution_writes(&mut self, count: usize) {
        self.failing_distribution_writes = count;
    }

    /// Name of a chromosome.
    pub fn chrom_name(&self, chrom_id: u32) -> Option<&str> {
        self.chromosomes.get(&chrom_id).map(|chrom| chrom.name.as_str())
    }

    /// Persisted value of a statistic by its persisted name.
    pub fn statistic(&self, track_id: u32, name: &str) -> Option<u64> {
        self.statistics
            .iter()
            .find(|((track, key), _)| *track == track_id && *key == name)
            .map(|(_, value)| *value)
    }

    /// Number of persisted statistic rows of a track.
    pub fn statistic_rows(&self, track_id: u32) -> usize {
        self.statistics
            .keys()
            .filter(|(track, _)| *track == track_id)
            .count()
    }

    /// Persisted bins of a distribution, keyed by distribution kind id.
    pub fn distribution_bins(&self, track_id: u32, kind_id: u8) -> Option<&[u64]> {
        self.distributions
            .get(&(track_id, kind_id))
            .map(Vec::as_slice)
    }

    /// Committed distributions of a track in kind order.
    pub fn distributions(&self, track_id: u32) -> Vec<(DistributionKind, &[u64])> {
        self.distributions
            .range((track_id, 0)..=(track_id, u8::MAX))
            .filter_map(|((_, kind_id), bins)| {
                DistributionKind::from_id(*kind_id).map(|kind| (kind, bins.as_slice()))
            })
            .collect()
    }

    fn chromosome(&self, chrom_id: u32) -> Result<&Chromosome, StoreError> {
        self.chromosomes
            .get(&chrom_id)
            .ok_or(StoreError::UnknownChromosome(chrom_id))
    }

    /// Tables receiving writes: the open transaction's copy, or the committed ones.
    fn tables_mut(&mut self) -> (&mut StatisticRows, &mut DistributionRows) {
        match &mut self.transaction {
            Some(transaction) => (&mut transaction.statistics, &mut transaction.distributions),
            None => (&mut self.statistics, &mut self.distributions),
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl ReferenceStore for MemoryStore {
    fn chrom_length(&self, chrom_id: u32) -> Result<u32, StoreError> {
        Ok(self.chromosome(chrom_id)?.sequence.len() as u32)
    }

    fn chrom_sequence(&self, chrom_id: u32, from: u32, to: u32) -> Result<Vec<u8>, StoreError> {
        let pending = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if pending.is_ok() {
            return Err(StoreError::Unavailable(format!(
                "chromosome {chrom_id} sequence {from}..={to}"
            )));
        }

        let chromosome = self.chromosome(chrom_id)?;
        check_range(chrom_id, from, to, chromosome.sequence.len() as u32)?;
        Ok(chromosome.sequence[from as usize - 1..to as usize].to_vec())
    }

    fn features_for_region(
        &self,
        from: u32,
        to: u32,
        types: &[FeatureType],
        chrom_id: u32,
    ) -> Result<Vec<FeatureRecord>, StoreError> {
        let chromosome = self.chromosome(chrom_id)?;
        Ok(overlapping(&chromosome.features, from, to, types))
    }
}

impl StatsStore for MemoryStore {
    fn begin_track(&mut self, track_id: u32) -> Result<(), StoreError> {
        self.check_writable()?;
        if let Some(open) = &self.transaction {
            return Err(StoreError::TransactionOpen(open.track_id));
        }
        self.transaction = Some(Transaction {
            track_id,
            statistics: self.statistics.clone(),
            distributions: self.distributions.clone(),
        });
        Ok(())
    }

    fn store_track_statistics(
        &mut self,
        stats: &StatsContainer,
        track_id: u32,
    ) -> Result<(), StoreError> {
        let (rows, _) = self.tables_mut();
        let mut staged = rows.clone();
        for (key, value) in stats.iter() {
            self.check_writable()?;
            staged.insert((track_id, key.name()), value);
        }
        *self.tables_mut().0 = staged;
        debug!(track_id, rows = stats.len(), "track statistics written");
        Ok(())
    }

    fn insert_count_distribution(
        &mut self,
        distribution: &CountingDistribution,
        track_id: u32,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.failing_distribution_writes > 0 {
            self.failing_distribution_writes -= 1;
            return Err(StoreError::Unavailable(format!(
                "distribution {} of track {track_id}",
                distribution.kind()
            )));
        }
        let (_, bins) = self.tables_mut();
        bins.insert(
            (track_id, distribution.kind().id()),
            distribution.discrete_counts().to_vec(),
        );
        Ok(())
    }

    fn commit_track(&mut self, track_id: u32) -> Result<(), StoreError> {
        if let Some(transaction) = self.transaction.take() {
            self.statistics = transaction.statistics;
            self.distributions = transaction.distributions;
            debug!(track_id, "track statistics committed");
        }
        Ok(())
    }

    fn rollback_track(&mut self, track_id: u32) -> Result<(), StoreError> {
        if self.transaction.take().is_some() {
            debug!(track_id, "track statistics rolled back");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatKey;

    fn store() -> MemoryStore {
        MemoryStore::new().with_chromosome(1, "chr1", b"acgtACGT")
    }

    #[test]
    fn sequence_ranges_are_one_based_inclusive() {
        let store = store();
        assert_eq!(store.chrom_length(1).unwrap(), 8);
        assert_eq!(store.chrom_sequence(1, 2, 4).unwrap(), b"CGT".to_vec());
        assert!(matches!(
            store.chrom_sequence(1, 5, 9),
            Err(StoreError::OutOfRange { length: 8, .. })
        ));
        assert!(matches!(
            store.chrom_sequence(2, 1, 1),
            Err(StoreError::UnknownChromosome(2))
        ));
    }

    #[test]
    fn transient_read_failures() {
        let store = store();
        store.fail_next_sequence_reads(1);
        assert!(matches!(
            store.chrom_sequence(1, 1, 2),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.chrom_sequence(1, 1, 2).is_ok());
    }

    #[test]
    fn read_only_write_leaves_previous_rows() {
        let mut store = store();
        let mut stats = StatsContainer::new();
        stats.prepare_for_track();
        stats.increase_value(StatKey::NoReads, 4).unwrap();
        store.store_track_statistics(&stats, 7).unwrap();

        stats.increase_value(StatKey::NoReads, 1).unwrap();
        store.set_read_only(true);
        assert!(matches!(
            store.store_track_statistics(&stats, 7),
            Err(StoreError::ReadOnly)
        ));
        assert_eq!(store.statistic(7, "NUM_READS"), Some(4));
        assert_eq!(store.statistic_rows(7), StatKey::SINGLE_END.len());
    }

    #[test]
    fn rollback_discards_the_whole_transaction() {
        let mut store = store();
        let mut stats = StatsContainer::new();
        stats.prepare_for_track();
        stats.increase_value(StatKey::NoReads, 4).unwrap();
        let mut lengths = CountingDistribution::new(DistributionKind::ReadLength);
        lengths.insert(36);

        store.begin_track(2).unwrap();
        store.store_track_statistics(&stats, 2).unwrap();
        store.insert_count_distribution(&lengths, 2).unwrap();
        assert_eq!(store.statistic_rows(2), 0);
        assert!(matches!(
            store.begin_track(3),
            Err(StoreError::TransactionOpen(2))
        ));
        store.rollback_track(2).unwrap();
        assert_eq!(store.statistic_rows(2), 0);
        assert!(store.distribution_bins(2, lengths.kind().id()).is_none());

        store.begin_track(2).unwrap();
        store.store_track_statistics(&stats, 2).unwrap();
        store.insert_count_distribution(&lengths, 2).unwrap();
        store.commit_track(2).unwrap();
        assert_eq!(store.statistic(2, "NUM_READS"), Some(4));
        assert_eq!(store.distribution_bins(2, lengths.kind().id()).map(<[u64]>::len), Some(101));

        let committed = store.distributions(2);
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].0, DistributionKind::ReadLength);
        assert_eq!(committed[0].1[2], 1);
        assert!(store.distributions(3).is_empty());
    }
}


