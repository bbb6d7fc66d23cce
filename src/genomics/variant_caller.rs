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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Difference, ReadClass, ReferenceGap, Strand};

    fn covered(left: u32, right: u32, depth: u32) -> CoverageManager {
        let mut coverage = CoverageManager::new(left, right);
        coverage.add_range(left, right, ReadClass::SinglePerfectMatch, Strand::Forward, depth);
        coverage
    }

    #[test]
    fn substitution_is_called_with_frequency() {
        let diffs = vec![Difference::new(3, b'C', 8).with_qualities(30, 60)];
        let config = SnpConfig::default()
            .with_min_mismatching_bases(5)
            .with_min_percentage(50.0);
        let grid = PositionCounterGrid::build(1, 5, &diffs, &[], &config);
        let caller = VariantCaller::new(config);

        let calls = caller.call(1, 1, &grid, &covered(1, 5, 10), b"GGAGG");
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.position, 3);
        assert_eq!(call.base, b'C');
        assert_eq!(call.reference_base, b'A');
        assert_eq!(call.comparison, SequenceComparison::Substitution);
        assert!((call.frequency - 80.0).abs() < 1e-9);
        assert_eq!(call.average_base_quality, Some(30));
        assert_eq!(call.average_mapping_quality, Some(60));
    }

    #[test]
    fn majority_equal_to_reference_is_skipped() {
        let diffs = vec![Difference::new(2, b'A', 6), Difference::new(2, b'C', 1)];
        let config = SnpConfig::default().with_min_mismatching_bases(2);
        let grid = PositionCounterGrid::build(1, 3, &diffs, &[], &config);
        let caller = VariantCaller::new(config);

        assert!(caller.call(1, 1, &grid, &covered(1, 3, 10), b"GAG").is_empty());
    }

    #[test]
    fn zero_coverage_is_forced_to_one() {
        let diffs = vec![Difference::new(2, b'-', 6)];
        let config = SnpConfig::default();
        let grid = PositionCounterGrid::build(1, 3, &diffs, &[], &config);
        let caller = VariantCaller::new(config);

        let calls = caller.call(1, 1, &grid, &CoverageManager::new(1, 3), b"GAG");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].coverage, 1);
        assert_eq!(calls[0].comparison, SequenceComparison::Deletion);
        assert!((calls[0].frequency - 600.0).abs() < 1e-9);
        assert_eq!(calls[0].average_base_quality, None);
    }

    #[test]
    fn low_average_quality_is_rejected() {
        let diffs = vec![Difference::new(2, b'T', 10).with_qualities(15, 60)];
        let config = SnpConfig::default().with_min_average_qualities(20, 0);
        let grid = PositionCounterGrid::build(1, 3, &diffs, &[], &config);
        let caller = VariantCaller::new(config);

        assert!(caller.call(1, 1, &grid, &covered(1, 3, 10), b"GAG").is_empty());
    }

    #[test]
    fn main_base_mode_uses_largest_count() {
        let diffs = vec![
            Difference::new(2, b'T', 3),
            Difference::new(2, b'C', 3),
        ];
        let grid = PositionCounterGrid::build(1, 3, &diffs, &[], &SnpConfig::default());

        let all_mismatches = VariantCaller::new(SnpConfig::default().with_min_mismatching_bases(5));
        assert_eq!(all_mismatches.call(1, 1, &grid, &covered(1, 3, 10), b"GAG").len(), 1);

        let main_base = VariantCaller::new(
            SnpConfig::default()
                .with_min_mismatching_bases(5)
                .with_main_base(true),
        );
        assert!(main_base.call(1, 1, &grid, &covered(1, 3, 10), b"GAG").is_empty());
    }

    #[test]
    fn insertions_are_called_per_gap_order() {
        let gaps = vec![
            ReferenceGap::new(2, b'T', 0, 6),
            ReferenceGap::new(2, b'T', 1, 6),
            ReferenceGap::new(2, b'G', 1, 1),
            ReferenceGap::new(2, b'A', 2, 1),
        ];
        let config = SnpConfig::default();
        let grid = PositionCounterGrid::build(1, 3, &[], &gaps, &config);
        let caller = VariantCaller::new(config);

        let calls = caller.call(4, 9, &grid, &covered(1, 3, 10), b"GAG");
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|call| call.comparison == SequenceComparison::Insertion));
        assert!(calls.iter().all(|call| call.reference_base == b'-'));
        assert_eq!(calls[0].gap_order, 1);
        assert_eq!(calls[1].gap_order, 2);
        assert_eq!(calls[1].counts.total(), 7);
        assert!((calls[1].frequency - 70.0).abs() < 1e-9);
    }
}
