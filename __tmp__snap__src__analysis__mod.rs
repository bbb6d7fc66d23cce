//! Batch-driven analysis pipeline.
//!
//! A producer streams one [`CoverageBatch`] per window of a [`WindowPlan`];
//! the track's [`BatchObserver`]s ([`SnpDetection`],
//! [`crate::stats::StatsCollector`]) process each batch synchronously on the
//! consumer thread. [`AnalysisRunner`] wires producers and consumers per track.

mod events;
mod observer;
mod registry;
mod runner;
mod snp_detection;
mod window;

pub use events::{CoverageBatch, IntervalRequest, TrackEvent};
pub use observer::BatchObserver;
pub use registry::{ConnectorRegistry, TrackConnector};
pub use runner::{AnalysisRunner, BatchSource, RecordBatchSource, RunSummary, TrackJob};
pub use snp_detection::SnpDetection;
pub use window::{Window, WindowPlan};


