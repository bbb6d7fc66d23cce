use crate::genomics::{CoverageManager, Difference, ReferenceGap};

/// One window of one track on one chromosome, 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalRequest {
    /// Track the window belongs to.
    pub track_id: u32,
    /// Chromosome of the window.
    pub chrom_id: u32,
    /// First position (inclusive).
    pub from: u32,
    /// Last position (inclusive).
    pub to: u32,
}

impl IntervalRequest {
    /// Number of positions requested.
    pub fn len(&self) -> u32 {
        self.to.saturating_sub(self.from) + 1
    }

    /// Whether `to` precedes `from`.
    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

/// Coverage, differences and gaps streamed for one requested window.
#[derive(Debug, Clone)]
pub struct CoverageBatch {
    /// Window the batch answers.
    pub request: IntervalRequest,
    /// Per-class stranded coverage of the window.
    pub coverage: CoverageManager,
    /// Substitution and deletion records.
    pub diffs: Vec<Difference>,
    /// Insertion records.
    pub gaps: Vec<ReferenceGap>,
}

/// Message sent from a batch producer to its track's consumer.
#[derive(Debug, Clone)]
pub enum TrackEvent {
    /// A window is ready.
    Batch(CoverageBatch),
    /// Every window of the track was sent.
    Finished {
        /// Track that completed.
        track_id: u32,
    },
}


