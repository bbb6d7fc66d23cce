//! Genomic primitives and the per-window calling algorithms.
//!
//! Data flows leaf first: difference and gap records are folded into a
//! [`PositionCounterGrid`], the [`VariantCaller`] scans the grid against the
//! reference window, and the [`CodonTranslator`] annotates calls with codon
//! effects of the coding features they hit.

pub mod codon;
pub mod io;
mod export;
mod features;
mod pileup;
mod statistics;
mod translator;
mod types;
mod variant_caller;

pub use export::{render_table, write_table, COLUMNS};
pub use features::{CursorError, FeatureCursor, FeatureId, FeatureRecord, FeatureTree, FeatureType};
pub use pileup::{PositionCounterGrid, PositionCounts, SlotCounter, NUM_METRICS};
pub use statistics::{average_quality, frequency, BaseCounts};
pub use translator::{CodonSnp, CodonTranslator, TranslationError};
pub use types::{
    BaseSlot, CoverageManager, Difference, ReadClass, ReadClassFilter, ReferenceGap, Strand,
    NUM_SLOTS,
};
pub use variant_caller::{SequenceComparison, SnpRecord, VariantCaller};


