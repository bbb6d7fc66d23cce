//! Fixed-bin counting distributions
//!
//! 101 bins whose widths follow a repeating schedule of percentages of an
//! adjustment value. The final bin is open-ended.

use std::fmt;

use thiserror::Error;

/// Number of bins of every distribution.
pub const NUM_BINS: usize = 101;

/// Default bin width schedule, in percent of the adjustment value (sums to 135).
pub const DEFAULT_BIN_STEPS: [u32; 10] = [1, 2, 3, 4, 5, 10, 15, 20, 25, 50];

/// Default adjustment value.
pub const DEFAULT_ADJUSTMENT: u32 = 1000;

/// Errors raised by [`CountingDistribution`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributionError {
    /// Bin index outside `0..NUM_BINS`.
    #[error("bin index {index} out of range (bins {bins})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of bins.
        bins: usize,
    },

    /// Distributions with different bin borders cannot be merged.
    #[error("cannot merge {left} distribution with {right} distribution of different borders")]
    BorderMismatch {
        /// Kind of the receiving distribution.
        left: DistributionKind,
        /// Kind of the merged distribution.
        right: DistributionKind,
    },
}

/// Statistic category summarised by a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistributionKind {
    /// Mapped read lengths.
    ReadLength,
    /// Read pair (insert) sizes.
    ReadPairSize,
    /// Absolute coverage increase between adjacent positions.
    CoverageIncrease,
    /// Coverage increase between adjacent positions, in percent.
    CoverageIncreasePercent,
}

impl DistributionKind {
    /// All kinds in persistence order.
    pub const ALL: [DistributionKind; 4] = [
        DistributionKind::ReadLength,
        DistributionKind::ReadPairSize,
        DistributionKind::CoverageIncrease,
        DistributionKind::CoverageIncreasePercent,
    ];

    /// Stable identifier used by the persistence layer.
    pub fn id(self) -> u8 {
        match self {
            DistributionKind::ReadLength => 1,
            DistributionKind::ReadPairSize => 2,
            DistributionKind::CoverageIncrease => 3,
            DistributionKind::CoverageIncreasePercent => 4,
        }
    }

    /// Kind for a persisted identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionKind::ReadLength => "read length",
            DistributionKind::ReadPairSize => "read pair size",
            DistributionKind::CoverageIncrease => "coverage increase",
            DistributionKind::CoverageIncreasePercent => "coverage increase percent",
        };
        f.write_str(name)
    }
}

/// Histogram over 101 non-uniform bins.
///
/// Bin `i` spans `[lower[i], upper[i]]`; widths are
/// `steps[i % 10] * adjustment / 100`, rounded down. Small adjustment values
/// produce zero-width bins; these are kept as they are so restored counts
/// line up with previously persisted bins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountingDistribution {
    kind: DistributionKind,
    adjustment: u32,
    lower: Vec<u32>,
    upper: Vec<u32>,
    counts: Vec<u64>,
    total: u64,
    inserted: u64,
    value_sum: u64,
    min: Option<u32>,
    max: Option<u32>,
}

impl CountingDistribution {
    /// Distribution with the default schedule and adjustment value.
    pub fn new(kind: DistributionKind) -> Self {
        Self::with_schedule(kind, DEFAULT_BIN_STEPS, DEFAULT_ADJUSTMENT)
    }

    /// Distribution with an explicit step schedule and adjustment value.
    pub fn with_schedule(kind: DistributionKind, steps: [u32; 10], adjustment: u32) -> Self {
        let mut lower = Vec::with_capacity(NUM_BINS);
        let mut upper = Vec::with_capacity(NUM_BINS);

        let mut border: u32 = 0;
        for idx in 0..NUM_BINS - 1 {
            let width = (steps[idx % steps.len()] as u64 * adjustment as u64 / 100) as u32;
            lower.push(border);
            border = border.saturating_add(width);
            upper.push(border.saturating_sub(1));
        }
        lower.push(border);
        upper.push(u32::MAX);

        Self {
            kind,
            adjustment,
            lower,
            upper,
            counts: vec![0; NUM_BINS],
            total: 0,
            inserted: 0,
            value_sum: 0,
            min: None,
            max: None,
        }
    }

    /// Statistic category.
    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    /// Adjustment value the borders were computed from.
    pub fn adjustment(&self) -> u32 {
        self.adjustment
    }

    /// Inclusive lower bin borders.
    pub fn lower_borders(&self) -> &[u32] {
        &self.lower
    }

    /// Inclusive upper bin borders; the last one is `u32::MAX`.
    pub fn upper_borders(&self) -> &[u32] {
        &self.upper
    }

    /// Bin a value falls into: the bin before the first whose lower border exceeds it.
    pub fn bin_index(&self, value: u32) -> usize {
        let exceeding = self.lower.partition_point(|&border| border <= value);
        exceeding.saturating_sub(1)
    }

    /// Count one value.
    pub fn insert(&mut self, value: u32) {
        let idx = self.bin_index(value);
        self.counts[idx] += 1;
        self.total += 1;
        self.inserted += 1;
        self.value_sum += value as u64;
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
    }

    /// Overwrite one bin's count, e.g. when restoring persisted bins.
    pub fn set_count_for_index(&mut self, index: usize, count: u64) -> Result<(), DistributionError> {
        let slot = self
            .counts
            .get_mut(index)
            .ok_or(DistributionError::IndexOutOfRange {
                index,
                bins: NUM_BINS,
            })?;
        self.total = self.total - *slot + count;
        *slot = count;
        Ok(())
    }

    /// Per-bin counts.
    pub fn discrete_counts(&self) -> &[u64] {
        &self.counts
    }

    /// Sum of all bin counts.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Whether every bin is zero.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    /// Truncated mean of inserted values, 0 when nothing was inserted.
    pub fn average_value(&self) -> u64 {
        if self.inserted == 0 {
            return 0;
        }
        self.value_sum / self.inserted
    }

    /// Smallest inserted value.
    pub fn min_value(&self) -> Option<u32> {
        self.min
    }

    /// Largest inserted value.
    pub fn max_value(&self) -> Option<u32> {
        self.max
    }

    /// Add another distribution's bins and running values.
    pub fn merge(&mut self, other: &Self) -> Result<(), DistributionError> {
        if self.lower != other.lower {
            return Err(DistributionError::BorderMismatch {
                left: self.kind,
                right: other.kind,
            });
        }
        for (count, other_count) in self.counts.iter_mut().zip(&other.counts) {
            *count += other_count;
        }
        self.total += other.total;
        self.inserted += other.inserted;
        self.value_sum += other.value_sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        Ok(())
    }
}
