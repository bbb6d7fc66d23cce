use crate::analysis::CoverageBatch;
use crate::AnalysisError;

/// Consumer of a track's batch stream.
///
/// Callbacks run synchronously on the track's consumer thread, so an observer
/// owns its state and needs no locking. Distinct tracks use distinct observers.
pub trait BatchObserver: Send {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Process one window.
    fn on_batch(&mut self, batch: &CoverageBatch) -> Result<(), AnalysisError>;

    /// Every window of `track_id` was delivered.
    fn on_finished(&mut self, _track_id: u32) -> Result<(), AnalysisError> {
        Ok(())
    }
}


