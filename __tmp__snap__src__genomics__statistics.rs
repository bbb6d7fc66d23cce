use crate::genomics::{BaseSlot, NUM_SLOTS};

/// Per-symbol read counts at one position, in slot order A, C, G, T, N, gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseCounts {
    counts: [u32; NUM_SLOTS],
}

impl BaseCounts {
    /// Wrap raw slot counts.
    pub fn new(counts: [u32; NUM_SLOTS]) -> Self {
        Self { counts }
    }

    /// Count for one slot.
    #[inline]
    pub fn get(&self, slot: BaseSlot) -> u32 {
        self.counts[slot.index()]
    }

    /// Raw slot counts.
    pub fn as_array(&self) -> &[u32; NUM_SLOTS] {
        &self.counts
    }

    /// Sum over every slot.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Slot with the highest count. Ties resolve to the earliest slot; `None` if all are zero.
    pub fn majority(&self) -> Option<(BaseSlot, u32)> {
        let mut best: Option<(BaseSlot, u32)> = None;
        for slot in BaseSlot::ALL {
            let count = self.get(slot);
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((slot, count));
            }
        }
        best
    }
}

/// Percentage of `count` among `coverage` reads.
pub fn frequency(count: u32, coverage: u32) -> f64 {
    if coverage == 0 {
        return 0.0;
    }
    count as f64 * 100.0 / coverage as f64
}

/// Truncating average of a quality sum; `None` when nothing was counted.
pub fn average_quality(sum: u64, count: u32) -> Option<u32> {
    if count == 0 {
        return None;
    }
    Some((sum / count as u64) as u32)
}
