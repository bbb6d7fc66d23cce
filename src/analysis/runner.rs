use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::analysis::{BatchObserver, CoverageBatch, IntervalRequest, TrackEvent, WindowPlan};
use crate::genomics::io::CoverageRecord;
use crate::genomics::{CoverageManager, Difference, ReferenceGap, Strand};
use crate::AnalysisError;

/// Producer of a track's batches, one window at a time.
pub trait BatchSource: Send {
    /// Track the batches belong to.
    fn track_id(&self) -> u32;

    /// Next window, or `None` once every window was produced.
    fn next_batch(&mut self) -> Result<Option<CoverageBatch>, AnalysisError>;
}

/// Batch source over parsed record lists, windowed by a [`WindowPlan`].
#[derive(Debug)]
pub struct RecordBatchSource {
    requests: std::vec::IntoIter<IntervalRequest>,
    track_id: u32,
    coverage: Vec<CoverageRecord>,
    diffs: Vec<Difference>,
    gaps: Vec<ReferenceGap>,
}

impl RecordBatchSource {
    /// Source for one track on one chromosome.
    pub fn new(
        track_id: u32,
        chrom_id: u32,
        plan: &WindowPlan,
        mut coverage: Vec<CoverageRecord>,
        mut diffs: Vec<Difference>,
        mut gaps: Vec<ReferenceGap>,
    ) -> Self {
        coverage.sort_by_key(|record| record.position);
        diffs.sort_by_key(|diff| diff.position);
        gaps.sort_by_key(|gap| (gap.position, gap.order));
        let requests: Vec<IntervalRequest> = plan.requests(track_id, chrom_id).collect();
        Self {
            requests: requests.into_iter(),
            track_id,
            coverage,
            diffs,
            gaps,
        }
    }
}

fn window_of<T>(records: &[T], from: u32, to: u32, position: impl Fn(&T) -> u32) -> &[T] {
    let start = records.partition_point(|record| position(record) < from);
    let end = records.partition_point(|record| position(record) <= to);
    &records[start..end.max(start)]
}

impl BatchSource for RecordBatchSource {
    fn track_id(&self) -> u32 {
        self.track_id
    }

    fn next_batch(&mut self) -> Result<Option<CoverageBatch>, AnalysisError> {
        let Some(request) = self.requests.next() else {
            return Ok(None);
        };
        let (from, to) = (request.from, request.to);

        let mut coverage = CoverageManager::new(from, to);
        for record in window_of(&self.coverage, from, to, |record| record.position) {
            coverage.add(record.position, record.class, Strand::Forward, record.forward);
            coverage.add(record.position, record.class, Strand::Reverse, record.reverse);
        }

        Ok(Some(CoverageBatch {
            request,
            coverage,
            diffs: window_of(&self.diffs, from, to, |diff| diff.position).to_vec(),
            gaps: window_of(&self.gaps, from, to, |gap| gap.position).to_vec(),
        }))
    }
}

/// One track's work: its batch source and the observers fed by it.
pub struct TrackJob<'a> {
    /// Producer of the track's windows.
    pub source: Box<dyn BatchSource + 'a>,
    /// Observers applied to every batch, in order.
    pub observers: Vec<&'a mut dyn BatchObserver>,
}

impl std::fmt::Debug for TrackJob<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackJob")
            .field("track_id", &self.source.track_id())
            .field(
                "observers",
                &self.observers.iter().map(|observer| observer.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Batches applied to observers.
    pub batches: u64,
    /// Tracks whose stream completed.
    pub tracks_finished: usize,
    /// Whether the run was stopped before completion.
    pub stopped: bool,
}

/// Drives track jobs concurrently.
///
/// Each track gets a producer thread streaming [`TrackEvent`]s over a
/// bounded channel and a consumer thread applying them to the track's
/// observers. Raising the stop flag ends both after the current batch.
#[derive(Debug, Clone)]
pub struct AnalysisRunner {
    stop: Arc<AtomicBool>,
    channel_capacity: usize,
}

impl Default for AnalysisRunner {
    fn default() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            channel_capacity: 4,
        }
    }
}

impl AnalysisRunner {
    /// Runner with a fresh stop flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches buffered per track between producer and consumer.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Stop flag shared with producers, consumers and [`crate::analysis::SnpDetection`].
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Request every running track to stop.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Run every job to completion, or until stopped.
    pub fn run(&self, jobs: Vec<TrackJob<'_>>) -> Result<RunSummary, AnalysisError> {
        let outcomes: Vec<Result<(u64, bool), AnalysisError>> = thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .into_iter()
                .map(|job| {
                    let (sender, receiver) = mpsc::sync_channel(self.channel_capacity);
                    let stop = &self.stop;
                    let TrackJob { source, observers } = job;
                    let producer = scope.spawn(move || produce(source, sender, stop));
                    let consumer = scope.spawn(move || consume(receiver, observers, stop));
                    (producer, consumer)
                })
                .collect();

            handles
                .into_iter()
                .map(|(producer, consumer)| {
                    let consumed = consumer.join().map_err(|_| AnalysisError::WorkerPanicked)?;
                    producer.join().map_err(|_| AnalysisError::WorkerPanicked)??;
                    consumed
                })
                .collect()
        });

        let mut summary = RunSummary::default();
        for outcome in outcomes {
            let (batches, finished) = outcome?;
            summary.batches += batches;
            if finished {
                summary.tracks_finished += 1;
            }
        }
        summary.stopped = self.stop.load(Ordering::SeqCst);
        info!(
            batches = summary.batches,
            tracks = summary.tracks_finished,
            stopped = summary.stopped,
            "analysis run complete"
        );
        Ok(summary)
    }
}

fn produce(
    mut source: Box<dyn BatchSource + '_>,
    sender: SyncSender<TrackEvent>,
    stop: &AtomicBool,
) -> Result<(), AnalysisError> {
    let track_id = source.track_id();
    while !stop.load(Ordering::SeqCst) {
        let event = match source.next_batch()? {
            Some(batch) => TrackEvent::Batch(batch),
            None => TrackEvent::Finished { track_id },
        };
        let finished = matches!(event, TrackEvent::Finished { .. });
        if sender.send(event).is_err() {
            debug!(track_id, "consumer gone, producer exiting");
            break;
        }
        if finished {
            break;
        }
    }
    Ok(())
}

fn consume(
    receiver: Receiver<TrackEvent>,
    mut observers: Vec<&mut dyn BatchObserver>,
    stop: &AtomicBool,
) -> Result<(u64, bool), AnalysisError> {
    let mut batches = 0;
    for event in receiver {
        match event {
            TrackEvent::Batch(batch) => {
                if stop.load(Ordering::SeqCst) {
                    debug!(track_id = batch.request.track_id, "stopped, dropping batch");
                    break;
                }
                for observer in observers.iter_mut() {
                    observer.on_batch(&batch)?;
                }
                batches += 1;
            }
            TrackEvent::Finished { track_id } => {
                for observer in observers.iter_mut() {
                    observer.on_finished(track_id)?;
                }
                return Ok((batches, true));
            }
        }
    }
    if !stop.load(Ordering::SeqCst) {
        warn!("batch stream ended without completion event");
    }
    Ok((batches, false))
}
