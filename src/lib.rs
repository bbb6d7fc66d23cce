//! # vartrack
//!
//! Variant calling and coverage statistics for sequencing tracks mapped to a
//! reference genome.
//!
//! ## Pipeline
//!
//! 1. **Windowing**: each chromosome is split into fixed-length windows
//!    ([`analysis::WindowPlan`]) and a producer streams one batch of coverage,
//!    difference and gap records per window.
//! 2. **Counting**: difference and gap records are folded into a per-position
//!    grid of base slots ([`genomics::PositionCounterGrid`]).
//! 3. **Calling**: [`genomics::VariantCaller`] applies count, quality and
//!    frequency thresholds and emits substitutions, deletions and insertions.
//! 4. **Annotation**: [`genomics::CodonTranslator`] derives codon effects of
//!    calls inside (possibly spliced) coding features.
//! 5. **Statistics**: [`stats::StatsCollector`] accumulates per-track counters
//!    and counting distributions and persists them through a
//!    [`store::StatsStore`].
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vartrack::analysis::{
//!     AnalysisRunner, BatchObserver, RecordBatchSource, SnpDetection, TrackJob, WindowPlan,
//! };
//! use vartrack::SnpConfig;
//!
//! let config = SnpConfig::default().with_min_percentage(50.0);
//! let plan = WindowPlan::new(chrom_length, config.interval_length)?;
//! let source = RecordBatchSource::new(1, 1, &plan, coverage, diffs, gaps);
//! let mut detection = SnpDetection::new(Arc::new(reference), config);
//! AnalysisRunner::new().run(vec![TrackJob {
//!     source: Box::new(source),
//!     observers: vec![&mut detection as &mut dyn BatchObserver],
//! }])?;
//! let calls = detection.into_results();
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod analysis; // Windowed batch pipeline
pub mod config; // Thresholds and filters
pub mod genomics; // Counting, calling and codon annotation
pub mod stats; // Per-track statistics and distributions
pub mod store; // Reference and statistics persistence

pub use analysis::{AnalysisRunner, BatchObserver, SnpDetection, WindowPlan};
pub use config::{ConfigError, SnpConfig};
pub use genomics::{CodonTranslator, PositionCounterGrid, SnpRecord, VariantCaller};
pub use stats::{CountingDistribution, StatsCollector, StatsContainer};
pub use store::{MemoryStore, ReferenceStore, StatsStore, StoreError};

use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Persistence collaborator failed.
    #[error(transparent)]
    Storage(#[from] store::StoreError),

    /// Invalid thresholds or window length.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Statistic key was not prepared for the track.
    #[error(transparent)]
    Stats(#[from] stats::StatsError),

    /// Distribution bin access failed.
    #[error(transparent)]
    Distribution(#[from] stats::DistributionError),

    /// Record input could not be parsed.
    #[error(transparent)]
    Parse(#[from] genomics::io::ParseError),

    /// No track registered under this id.
    #[error("unknown track {0}")]
    UnknownTrack(u32),

    /// No reference registered under this id.
    #[error("unknown reference {0}")]
    UnknownReference(u32),

    /// A producer or consumer thread panicked.
    #[error("analysis worker panicked")]
    WorkerPanicked,
}
