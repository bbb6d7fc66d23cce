//! Persistence seam: reference sequences, features and track statistics.
//!
//! The analysis reads through [`ReferenceStore`] and writes through
//! [`StatsStore`]. [`MemoryStore`] backs tests and small runs;
//! [`FastaReference`] reads an indexed FASTA via htslib.

mod fasta;
mod memory;

pub use fasta::FastaReference;
pub use memory::MemoryStore;

use thiserror::Error;

use crate::genomics::{FeatureRecord, FeatureType};
use crate::stats::{CountingDistribution, StatsContainer};

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend temporarily unreadable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// No chromosome with this identifier.
    #[error("unknown chromosome {0}")]
    UnknownChromosome(u32),

    /// Writes rejected by the backend.
    #[error("store is read-only")]
    ReadOnly,

    /// A statistics transaction is already open.
    #[error("statistics transaction already open for track {0}")]
    TransactionOpen(u32),

    /// Requested range lies outside the chromosome.
    #[error("range {from}..={to} outside chromosome {chrom_id} of length {length}")]
    OutOfRange {
        /// Chromosome queried.
        chrom_id: u32,
        /// First requested position.
        from: u32,
        /// Last requested position.
        to: u32,
        /// Chromosome length.
        length: u32,
    },

    /// htslib failure.
    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),
}

/// Read access to reference chromosomes and their annotations.
///
/// Positions are 1-based and inclusive.
pub trait ReferenceStore: Send + Sync {
    /// Length of a chromosome in bases.
    fn chrom_length(&self, chrom_id: u32) -> Result<u32, StoreError>;

    /// Bases `from..=to` of a chromosome.
    fn chrom_sequence(&self, chrom_id: u32, from: u32, to: u32) -> Result<Vec<u8>, StoreError>;

    /// Features of the given types overlapping `from..=to`; all types if `types` is empty.
    fn features_for_region(
        &self,
        from: u32,
        to: u32,
        types: &[FeatureType],
        chrom_id: u32,
    ) -> Result<Vec<FeatureRecord>, StoreError>;
}

/// Write access for per-track statistics.
///
/// Writes between [`StatsStore::begin_track`] and [`StatsStore::commit_track`]
/// become visible together; [`StatsStore::rollback_track`] discards them. A
/// failing call must leave previously persisted data untouched.
pub trait StatsStore {
    /// Open a write transaction for one track.
    fn begin_track(&mut self, track_id: u32) -> Result<(), StoreError>;

    /// Persist one row per statistic key of `stats`.
    fn store_track_statistics(
        &mut self,
        stats: &StatsContainer,
        track_id: u32,
    ) -> Result<(), StoreError>;

    /// Persist the bins of one distribution.
    fn insert_count_distribution(
        &mut self,
        distribution: &CountingDistribution,
        track_id: u32,
    ) -> Result<(), StoreError>;

    /// Make every write since `begin_track` visible.
    fn commit_track(&mut self, track_id: u32) -> Result<(), StoreError>;

    /// Discard every write since `begin_track`.
    fn rollback_track(&mut self, track_id: u32) -> Result<(), StoreError>;
}

fn check_range(chrom_id: u32, from: u32, to: u32, length: u32) -> Result<(), StoreError> {
    if from == 0 || to < from || to > length {
        return Err(StoreError::OutOfRange {
            chrom_id,
            from,
            to,
            length,
        });
    }
    Ok(())
}

fn overlapping(
    features: &[FeatureRecord],
    from: u32,
    to: u32,
    types: &[FeatureType],
) -> Vec<FeatureRecord> {
    features
        .iter()
        .filter(|feature| feature.start <= to && feature.stop >= from)
        .filter(|feature| types.is_empty() || types.contains(&feature.feature_type))
        .cloned()
        .collect()
}
