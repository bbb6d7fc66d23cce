use std::collections::HashMap;
use std::sync::Arc;

use crate::AnalysisError;

/// Description of a mapping track and the reference it was mapped against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackConnector {
    /// Track identifier.
    pub track_id: u32,
    /// Identifier of the reference connector.
    pub reference_id: u32,
    /// Display name.
    pub description: String,
    /// Whether the track holds read pairs.
    pub read_pairs: bool,
}

impl TrackConnector {
    /// Single-end track on `reference_id`.
    pub fn new(track_id: u32, reference_id: u32, description: impl Into<String>) -> Self {
        Self {
            track_id,
            reference_id,
            description: description.into(),
            read_pairs: false,
        }
    }

    /// Mark the track as a read pair track.
    pub fn with_read_pairs(mut self, read_pairs: bool) -> Self {
        self.read_pairs = read_pairs;
        self
    }
}

/// Registry owning reference connectors and track descriptions.
///
/// Components receive the registry (or handles obtained from it) rather than
/// looking connectors up globally. References are shared as `Arc<R>`.
#[derive(Debug)]
pub struct ConnectorRegistry<R> {
    references: HashMap<u32, Arc<R>>,
    tracks: HashMap<u32, TrackConnector>,
}

impl<R> Default for ConnectorRegistry<R> {
    fn default() -> Self {
        Self {
            references: HashMap::new(),
            tracks: HashMap::new(),
        }
    }
}

impl<R> ConnectorRegistry<R> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reference connector and return a handle to it.
    pub fn register_reference(&mut self, reference_id: u32, reference: R) -> Arc<R> {
        let arc = Arc::new(reference);
        self.references.insert(reference_id, Arc::clone(&arc));
        arc
    }

    /// Register a track; its reference must already be registered.
    pub fn register_track(&mut self, track: TrackConnector) -> Result<(), AnalysisError> {
        if !self.references.contains_key(&track.reference_id) {
            return Err(AnalysisError::UnknownReference(track.reference_id));
        }
        self.tracks.insert(track.track_id, track);
        Ok(())
    }

    /// Reference connector by id.
    pub fn reference(&self, reference_id: u32) -> Option<Arc<R>> {
        self.references.get(&reference_id).map(Arc::clone)
    }

    /// Track description by id.
    pub fn track(&self, track_id: u32) -> Option<&TrackConnector> {
        self.tracks.get(&track_id)
    }

    /// Reference connector a track was mapped against.
    pub fn reference_for_track(&self, track_id: u32) -> Result<Arc<R>, AnalysisError> {
        let track = self
            .track(track_id)
            .ok_or(AnalysisError::UnknownTrack(track_id))?;
        self.reference(track.reference_id)
            .ok_or(AnalysisError::UnknownReference(track.reference_id))
    }

    /// Registered tracks sorted by id.
    pub fn tracks(&self) -> Vec<&TrackConnector> {
        let mut tracks: Vec<&TrackConnector> = self.tracks.values().collect();
        tracks.sort_by_key(|track| track.track_id);
        tracks
    }
}
