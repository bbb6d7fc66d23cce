use crate::config::SnpConfig;
use crate::genomics::{BaseCounts, BaseSlot, Difference, ReferenceGap, NUM_SLOTS};

/// Number of metrics tracked per symbol slot: count, base-quality sum, mapping-quality sum.
pub const NUM_METRICS: usize = 3;

/// Accumulated metrics for one symbol slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounter {
    /// Number of reads.
    pub count: u32,
    /// Sum of base qualities over all counted reads.
    pub base_quality_sum: u64,
    /// Sum of mapping qualities over all counted reads.
    pub mapping_quality_sum: u64,
}

impl SlotCounter {
    /// Metrics in grid order `[count, base quality sum, mapping quality sum]`.
    pub fn metrics(&self) -> [u64; NUM_METRICS] {
        [
            self.count as u64,
            self.base_quality_sum,
            self.mapping_quality_sum,
        ]
    }
}

/// Slot counters for a single position (or a single inserted base).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionCounts {
    slots: [SlotCounter; NUM_SLOTS],
}

impl PositionCounts {
    pub(crate) fn observe(
        &mut self,
        slot: BaseSlot,
        count: u32,
        base_quality: Option<u8>,
        mapping_quality: Option<u8>,
    ) {
        let counter = &mut self.slots[slot.index()];
        counter.count += count;
        if let Some(quality) = base_quality {
            counter.base_quality_sum += quality as u64 * count as u64;
        }
        if let Some(quality) = mapping_quality {
            counter.mapping_quality_sum += quality as u64 * count as u64;
        }
    }

    /// Counter of one slot.
    #[inline]
    pub fn slot(&self, slot: BaseSlot) -> &SlotCounter {
        &self.slots[slot.index()]
    }

    /// Read counts of every slot.
    pub fn base_counts(&self) -> BaseCounts {
        BaseCounts::new(std::array::from_fn(|idx| self.slots[idx].count))
    }

    /// Whether no read was counted at all.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.count == 0)
    }
}

/// Per-window counters built from streamed difference and gap records.
///
/// The grid covers the inclusive window `[left, right]` and is indexed by
/// position relative to `left`. Matches are never counted: every slot holds
/// reads that disagree with the reference.
#[derive(Debug, Clone)]
pub struct PositionCounterGrid {
    left: u32,
    right: u32,
    positions: Vec<PositionCounts>,
    gaps: Vec<Vec<PositionCounts>>,
    has_base_qualities: bool,
    has_mapping_qualities: bool,
}

impl PositionCounterGrid {
    /// Build the grid for `[left, right]`.
    ///
    /// Records outside the window or of an excluded read class are ignored.
    /// A record is counted when its base quality is unknown or strictly above
    /// `config.min_base_quality`. Any counted-window record lacking a quality
    /// clears the matching completeness flag for the whole window.
    pub fn build(
        left: u32,
        right: u32,
        diffs: &[Difference],
        gaps: &[ReferenceGap],
        config: &SnpConfig,
    ) -> Self {
        let len = right.saturating_sub(left) as usize + 1;
        let mut grid = Self {
            left,
            right,
            positions: vec![PositionCounts::default(); len],
            gaps: vec![Vec::new(); len],
            has_base_qualities: true,
            has_mapping_qualities: true,
        };

        for diff in diffs {
            let Some(offset) = grid.offset(diff.position) else {
                continue;
            };
            if !config.read_classes.includes(diff.class) {
                continue;
            }
            grid.note_qualities(diff.base_quality, diff.mapping_quality);
            if !passes_quality(diff.base_quality, config.min_base_quality) {
                continue;
            }
            let slot = BaseSlot::from_stranded_base(diff.base, diff.strand);
            grid.positions[offset].observe(
                slot,
                diff.count,
                diff.base_quality,
                diff.mapping_quality,
            );
        }

        for gap in gaps {
            let Some(offset) = grid.offset(gap.position) else {
                continue;
            };
            if !config.read_classes.includes(gap.class) {
                continue;
            }
            grid.note_qualities(gap.base_quality, gap.mapping_quality);
            if !passes_quality(gap.base_quality, config.min_base_quality) {
                continue;
            }
            let order = gap.order as usize;
            let orders = &mut grid.gaps[offset];
            if orders.len() <= order {
                orders.resize(order + 1, PositionCounts::default());
            }
            let slot = BaseSlot::from_stranded_base(gap.base, gap.strand);
            orders[order].observe(slot, gap.count, gap.base_quality, gap.mapping_quality);
        }

        grid
    }

    fn offset(&self, position: u32) -> Option<usize> {
        if position < self.left || position > self.right {
            return None;
        }
        Some((position - self.left) as usize)
    }

    fn note_qualities(&mut self, base_quality: Option<u8>, mapping_quality: Option<u8>) {
        if base_quality.is_none() {
            self.has_base_qualities = false;
        }
        if mapping_quality.is_none() {
            self.has_mapping_qualities = false;
        }
    }

    /// Left window bound (inclusive).
    pub fn left_bound(&self) -> u32 {
        self.left
    }

    /// Right window bound (inclusive).
    pub fn right_bound(&self) -> u32 {
        self.right
    }

    /// Number of positions in the window.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the grid holds no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether every counted record carried a base quality.
    pub fn has_base_qualities(&self) -> bool {
        self.has_base_qualities
    }

    /// Whether every counted record carried a mapping quality.
    pub fn has_mapping_qualities(&self) -> bool {
        self.has_mapping_qualities
    }

    /// Counters at a relative offset.
    pub fn at(&self, offset: usize) -> Option<&PositionCounts> {
        self.positions.get(offset)
    }

    /// Counters at an absolute position.
    pub fn at_position(&self, position: u32) -> Option<&PositionCounts> {
        self.offset(position).and_then(|offset| self.at(offset))
    }

    /// Insertion counters at a relative offset, indexed by gap order.
    pub fn gaps_at(&self, offset: usize) -> &[PositionCounts] {
        self.gaps.get(offset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(absolute position, counters, insertion counters)` over the window.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &PositionCounts, &[PositionCounts])> + '_ {
        self.positions
            .iter()
            .zip(self.gaps.iter())
            .enumerate()
            .map(move |(offset, (counts, gaps))| {
                (self.left + offset as u32, counts, gaps.as_slice())
            })
    }
}

fn passes_quality(base_quality: Option<u8>, min_base_quality: u8) -> bool {
    base_quality.map_or(true, |quality| quality > min_base_quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ReadClass, ReadClassFilter, Strand};

    #[test]
    fn grid_aggregates_counts_and_qualities() {
        let diffs = vec![
            Difference::new(101, b'C', 3).with_qualities(30, 60),
            Difference::new(101, b'G', 1)
                .on_strand(Strand::Reverse)
                .with_qualities(20, 40),
            Difference::new(103, b'-', 2).with_qualities(35, 50),
            Difference::new(250, b'A', 9).with_qualities(35, 50),
        ];
        let config = SnpConfig::default();
        let grid = PositionCounterGrid::build(100, 110, &diffs, &[], &config);

        assert_eq!(grid.len(), 11);
        let counts = grid.at_position(101).unwrap();
        assert_eq!(counts.slot(BaseSlot::C).count, 4);
        assert_eq!(counts.slot(BaseSlot::C).base_quality_sum, 3 * 30 + 20);
        assert_eq!(counts.slot(BaseSlot::C).mapping_quality_sum, 3 * 60 + 40);
        assert_eq!(grid.at_position(103).unwrap().slot(BaseSlot::Gap).count, 2);
        assert!(grid.has_base_qualities());
        assert!(grid.has_mapping_qualities());
    }

    #[test]
    fn quality_filter_is_strict_and_unknown_passes() {
        let diffs = vec![
            Difference::new(5, b'T', 1).with_qualities(20, 60),
            Difference::new(5, b'T', 1).with_qualities(21, 60),
            Difference::new(5, b'T', 1),
        ];
        let config = SnpConfig::default().with_min_base_quality(20);
        let grid = PositionCounterGrid::build(1, 10, &diffs, &[], &config);

        assert_eq!(grid.at_position(5).unwrap().slot(BaseSlot::T).count, 2);
        assert!(!grid.has_base_qualities());
        assert!(!grid.has_mapping_qualities());
    }

    #[test]
    fn gaps_are_split_by_order_and_class() {
        let gaps = vec![
            ReferenceGap::new(7, b'A', 0, 2),
            ReferenceGap::new(7, b'C', 1, 2),
            ReferenceGap::new(7, b'C', 1, 5).with_class(ReadClass::CommonMatch),
        ];
        let config = SnpConfig::default()
            .with_read_classes(ReadClassFilter::all().excluding(ReadClass::CommonMatch));
        let grid = PositionCounterGrid::build(1, 10, &[], &gaps, &config);

        let orders = grid.gaps_at(6);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].slot(BaseSlot::A).count, 2);
        assert_eq!(orders[1].slot(BaseSlot::C).count, 2);
        assert!(grid.at_position(7).unwrap().is_empty());
    }

    #[test]
    fn gap_records_use_the_same_quality_rules() {
        let config = SnpConfig::default().with_min_base_quality(20);
        let gaps = vec![
            ReferenceGap::new(4, b'G', 0, 3).with_qualities(20, 50),
            ReferenceGap::new(4, b'G', 0, 2).with_qualities(21, 50),
        ];
        let grid = PositionCounterGrid::build(1, 10, &[], &gaps, &config);
        let kept = grid.gaps_at(3)[0].slot(BaseSlot::G);
        assert_eq!(kept.metrics(), [2, 2 * 21, 2 * 50]);
        assert!(grid.has_base_qualities());
        assert!(grid.has_mapping_qualities());

        let mut with_unknown = gaps.clone();
        with_unknown.push(ReferenceGap::new(4, b'G', 0, 4));
        let grid = PositionCounterGrid::build(1, 10, &[], &with_unknown, &config);
        assert_eq!(grid.gaps_at(3)[0].slot(BaseSlot::G).metrics(), [6, 2 * 21, 2 * 50]);
        assert!(!grid.has_base_qualities());
        assert!(!grid.has_mapping_qualities());
    }
}


