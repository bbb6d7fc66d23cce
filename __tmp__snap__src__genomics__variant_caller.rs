use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, warn};

use crate::config::SnpConfig;
use crate::genomics::statistics::{average_quality, frequency};
use crate::genomics::{
    BaseCounts, BaseSlot, CodonSnp, CoverageManager, PositionCounterGrid, PositionCounts,
};

/// Classification of a call or of a codon effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceComparison {
    /// Same symbol or same amino acid.
    Match,
    /// Base substitution.
    Substitution,
    /// Different amino acid of the same property class.
    Neutral,
    /// Different amino acid of another property class.
    Missense,
    /// Inserted base.
    Insertion,
    /// Deleted reference base.
    Deletion,
    /// Not determined.
    Unknown,
}

impl SequenceComparison {
    /// Label used in exported tables.
    pub fn label(self) -> &'static str {
        match self {
            SequenceComparison::Match => "match",
            SequenceComparison::Substitution => "substitution",
            SequenceComparison::Neutral => "neutral",
            SequenceComparison::Missense => "missense",
            SequenceComparison::Insertion => "insertion",
            SequenceComparison::Deletion => "deletion",
            SequenceComparison::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SequenceComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Variant call at one reference position (or one inserted base).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnpRecord {
    /// 1-based reference position.
    pub position: u32,
    /// 0 for substitutions and deletions, `order + 1` for inserted bases.
    pub gap_order: u32,
    /// Track the call was made on.
    pub track_id: u32,
    /// Chromosome of the call.
    pub chrom_id: u32,
    /// Called symbol (upper-case, `-` for deletions).
    pub base: u8,
    /// Reference symbol (`-` for insertions).
    pub reference_base: u8,
    /// Mismatch counts per symbol.
    pub counts: BaseCounts,
    /// Reads covering the position; never zero.
    pub coverage: u32,
    /// Variant frequency in percent.
    pub frequency: f64,
    /// Kind of call.
    pub comparison: SequenceComparison,
    /// Average base quality of the called symbol, `None` when qualities are unavailable.
    pub average_base_quality: Option<u32>,
    /// Average mapping quality of the called symbol, `None` when qualities are unavailable.
    pub average_mapping_quality: Option<u32>,
    /// Codon effects, one per overlapping coding feature.
    pub codons: Vec<CodonSnp>,
}

impl SnpRecord {
    /// Ordering used for result lists: position, then gap order, then track.
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then(self.gap_order.cmp(&other.gap_order))
            .then(self.track_id.cmp(&other.track_id))
    }
}

/// Candidate that passed the count, quality and frequency gates.
#[derive(Debug)]
struct Candidate {
    slot: BaseSlot,
    counts: BaseCounts,
    coverage: u32,
    frequency: f64,
    average_base_quality: Option<u32>,
    average_mapping_quality: Option<u32>,
}

/// Threshold-based caller scanning a [`PositionCounterGrid`].
#[derive(Debug, Clone)]
pub struct VariantCaller {
    config: SnpConfig,
}

impl VariantCaller {
    /// Create a caller with the given thresholds.
    pub fn new(config: SnpConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &SnpConfig {
        &self.config
    }

    /// Call variants in the grid's window.
    ///
    /// `reference` holds the reference bases of the window, starting at the
    /// grid's left bound. Positions whose majority mismatch symbol equals the
    /// reference base are skipped.
    pub fn call(
        &self,
        track_id: u32,
        chrom_id: u32,
        grid: &PositionCounterGrid,
        coverage: &CoverageManager,
        reference: &[u8],
    ) -> Vec<SnpRecord> {
        let mut calls = Vec::new();

        for (offset, (position, counts, gaps)) in grid.iter().enumerate() {
            if let Some(candidate) = self.evaluate(position, counts, true, grid, coverage) {
                let reference_base = reference
                    .get(offset)
                    .map(u8::to_ascii_uppercase)
                    .unwrap_or(b'N');
                if candidate.slot.symbol() != reference_base {
                    let comparison = if candidate.slot == BaseSlot::Gap {
                        SequenceComparison::Deletion
                    } else {
                        SequenceComparison::Substitution
                    };
                    calls.push(candidate.into_record(
                        position,
                        0,
                        track_id,
                        chrom_id,
                        reference_base,
                        comparison,
                    ));
                }
            }

            for (order, gap_counts) in gaps.iter().enumerate() {
                if let Some(candidate) = self.evaluate(position, gap_counts, false, grid, coverage)
                {
                    calls.push(candidate.into_record(
                        position,
                        order as u32 + 1,
                        track_id,
                        chrom_id,
                        b'-',
                        SequenceComparison::Insertion,
                    ));
                }
            }
        }

        debug!(
            track_id,
            chrom_id,
            left = grid.left_bound(),
            right = grid.right_bound(),
            calls = calls.len(),
            "window scanned"
        );
        calls
    }

    fn evaluate(
        &self,
        position: u32,
        counts: &PositionCounts,
        include_gap: bool,
        grid: &PositionCounterGrid,
        coverage: &CoverageManager,
    ) -> Option<Candidate> {
        let mut base_counts = counts.base_counts();
        if !include_gap {
            let mut raw = *base_counts.as_array();
            raw[BaseSlot::Gap.index()] = 0;
            base_counts = BaseCounts::new(raw);
        }

        let diff_count = base_counts.total();
        let (slot, max_count) = base_counts.majority()?;

        let supporting = if self.config.use_main_base {
            max_count
        } else {
            diff_count
        };
        if supporting < self.config.min_mismatching_bases {
            return None;
        }

        let counter = counts.slot(slot);
        let average_base_quality = if grid.has_base_qualities() {
            let average = average_quality(counter.base_quality_sum, max_count)?;
            if average < self.config.min_average_base_quality {
                return None;
            }
            Some(average)
        } else {
            None
        };
        let average_mapping_quality = if grid.has_mapping_qualities() {
            let average = average_quality(counter.mapping_quality_sum, max_count)?;
            if average < self.config.min_average_mapping_quality {
                return None;
            }
            Some(average)
        } else {
            None
        };

        let mut total = coverage.total_coverage(position, &self.config.read_classes);
        if total == 0 {
            warn!(position, "mismatches found at an uncovered position, using coverage 1");
            total = 1;
        }

        let frequency = frequency(supporting, total);
        if frequency < self.config.min_percentage {
            return None;
        }

        Some(Candidate {
            slot,
            counts: base_counts,
            coverage: total,
            frequency,
            average_base_quality,
            average_mapping_quality,
        })
    }
}

impl Candidate {
    fn into_record(
        self,
        position: u32,
        gap_order: u32,
        track_id: u32,
        chrom_id: u32,
        reference_base: u8,
        comparison: SequenceComparison,
    ) -> SnpRecord {
        SnpRecord {
            position,
            gap_order,
            track_id,
            chrom_id,
            base: self.slot.symbol(),
            reference_base,
            counts: self.counts,
            coverage: self.coverage,
            frequency: self.frequency,
            comparison,
            average_base_quality: self.average_base_quality,
            average_mapping_quality: self.average_mapping_quality,
            codons: Vec::new(),
        }
    }
}
