use crate::analysis::IntervalRequest;
use crate::config::ConfigError;

/// One window of a [`WindowPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// 1-indexed window identifier.
    pub window_id: usize,
    /// First position (1-based, inclusive).
    pub from: u32,
    /// Last position (inclusive).
    pub to: u32,
}

/// Partition of a chromosome into fixed-length windows.
///
/// The last window is shortened to end at the chromosome end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    /// Chromosome length in bases.
    pub chrom_length: u32,
    /// Bases per window.
    pub interval_length: u32,
    /// Number of windows `⌈chrom_length / interval_length⌉`.
    pub num_windows: usize,
}

impl WindowPlan {
    /// Plan windows of `interval_length` bases over a chromosome.
    pub fn new(chrom_length: u32, interval_length: u32) -> Result<Self, ConfigError> {
        if interval_length == 0 {
            return Err(ConfigError::ZeroIntervalLength);
        }
        let num_windows = chrom_length.div_ceil(interval_length) as usize;
        Ok(Self {
            chrom_length,
            interval_length,
            num_windows,
        })
    }

    /// Window for a 1-indexed identifier.
    pub fn window(&self, window_id: usize) -> Option<Window> {
        if window_id == 0 || window_id > self.num_windows {
            return None;
        }
        let from = (window_id as u64 - 1) * self.interval_length as u64 + 1;
        let to = (from + self.interval_length as u64 - 1).min(self.chrom_length as u64);
        Some(Window {
            window_id,
            from: from as u32,
            to: to as u32,
        })
    }

    /// Windows in ascending order.
    pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
        (1..=self.num_windows).filter_map(|window_id| self.window(window_id))
    }

    /// Interval requests of one track, in ascending order.
    pub fn requests(&self, track_id: u32, chrom_id: u32) -> impl Iterator<Item = IntervalRequest> + '_ {
        self.windows().map(move |window| IntervalRequest {
            track_id,
            chrom_id,
            from: window.from,
            to: window.to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_cover_chromosome() {
        let plan = WindowPlan::new(250, 100).unwrap();
        assert_eq!(plan.num_windows, 3);
        let spans: Vec<(u32, u32)> = plan.windows().map(|w| (w.from, w.to)).collect();
        assert_eq!(spans, vec![(1, 100), (101, 200), (201, 250)]);
        assert!(plan.window(0).is_none());
        assert!(plan.window(4).is_none());
    }

    #[test]
    fn rejects_zero_interval() {
        assert_eq!(WindowPlan::new(10, 0), Err(ConfigError::ZeroIntervalLength));
    }

    #[test]
    fn empty_chromosome_has_no_windows() {
        let plan = WindowPlan::new(0, 100).unwrap();
        assert_eq!(plan.requests(1, 1).count(), 0);
    }
}


