use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analysis::{BatchObserver, CoverageBatch};
use crate::config::SnpConfig;
use crate::genomics::{
    CodonTranslator, FeatureTree, FeatureType, PositionCounterGrid, SnpRecord, VariantCaller,
};
use crate::store::{ReferenceStore, StoreError};
use crate::AnalysisError;

const CODING_TYPES: [FeatureType; 6] = [
    FeatureType::Gene,
    FeatureType::Mrna,
    FeatureType::Rrna,
    FeatureType::Trna,
    FeatureType::Cds,
    FeatureType::Exon,
];

/// Variant detection for the tracks of one analysis.
///
/// Each batch is called and annotated in isolation and appended to the
/// result list as a whole. Once the stop flag is raised, pending and
/// in-flight batches are discarded.
#[derive(Debug)]
pub struct SnpDetection<R: ReferenceStore + ?Sized> {
    reference: Arc<R>,
    caller: VariantCaller,
    translators: HashMap<u32, CodonTranslator>,
    results: Vec<SnpRecord>,
    stop: Arc<AtomicBool>,
    windows_done: u64,
    windows_skipped: u64,
}

impl<R: ReferenceStore + ?Sized> SnpDetection<R> {
    /// Detection against `reference` with the given thresholds.
    pub fn new(reference: Arc<R>, config: SnpConfig) -> Self {
        Self {
            reference,
            caller: VariantCaller::new(config),
            translators: HashMap::new(),
            results: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            windows_done: 0,
            windows_skipped: 0,
        }
    }

    /// Share a stop flag with the runner driving this detection.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Calls gathered so far.
    pub fn results(&self) -> &[SnpRecord] {
        &self.results
    }

    /// Consume the detection, returning the calls sorted by position.
    pub fn into_results(mut self) -> Vec<SnpRecord> {
        self.results.sort_by(SnpRecord::cmp_position);
        self.results
    }

    /// Windows whose calls were applied.
    pub fn windows_done(&self) -> u64 {
        self.windows_done
    }

    /// Windows skipped because the reference could not be read.
    pub fn windows_skipped(&self) -> u64 {
        self.windows_skipped
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn translator(&mut self, chrom_id: u32) -> Result<&mut CodonTranslator, StoreError> {
        if !self.translators.contains_key(&chrom_id) {
            let length = self.reference.chrom_length(chrom_id)?;
            let sequence: Arc<[u8]> = if length == 0 {
                Arc::from(Vec::new())
            } else {
                Arc::from(self.reference.chrom_sequence(chrom_id, 1, length)?)
            };
            let features = self
                .reference
                .features_for_region(1, length.max(1), &CODING_TYPES, chrom_id)?;
            debug!(chrom_id, features = features.len(), "codon translator prepared");
            let tree = Arc::new(FeatureTree::new(features));
            self.translators
                .insert(chrom_id, CodonTranslator::new(tree, sequence));
        }
        self.translators
            .get_mut(&chrom_id)
            .ok_or(StoreError::UnknownChromosome(chrom_id))
    }

    fn detect(&mut self, batch: &CoverageBatch) -> Result<Vec<SnpRecord>, StoreError> {
        let request = batch.request;
        let reference = self
            .reference
            .chrom_sequence(request.chrom_id, request.from, request.to)?;
        let grid = PositionCounterGrid::build(
            request.from,
            request.to,
            &batch.diffs,
            &batch.gaps,
            self.caller.config(),
        );
        let mut calls = self.caller.call(
            request.track_id,
            request.chrom_id,
            &grid,
            &batch.coverage,
            &reference,
        );

        if self.caller.config().translate_codons && !calls.is_empty() {
            self.translator(request.chrom_id)?.annotate_all(&mut calls);
        }
        Ok(calls)
    }
}

impl<R: ReferenceStore + ?Sized> BatchObserver for SnpDetection<R> {
    fn name(&self) -> &'static str {
        "snp detection"
    }

    fn on_batch(&mut self, batch: &CoverageBatch) -> Result<(), AnalysisError> {
        if self.stopped() {
            return Ok(());
        }
        let request = batch.request;
        let calls = match self.detect(batch) {
            Ok(calls) => calls,
            Err(err) => {
                warn!(
                    track_id = request.track_id,
                    chrom_id = request.chrom_id,
                    window = %format_args!("{}..={}", request.from, request.to),
                    %err,
                    "reference unreadable, skipping window"
                );
                self.windows_skipped += 1;
                return Ok(());
            }
        };

        if self.stopped() {
            debug!(
                track_id = request.track_id,
                discarded = calls.len(),
                "analysis stopped, window discarded"
            );
            return Ok(());
        }
        self.results.extend(calls);
        self.windows_done += 1;
        Ok(())
    }

    fn on_finished(&mut self, track_id: u32) -> Result<(), AnalysisError> {
        self.results.sort_by(SnpRecord::cmp_position);
        info!(
            track_id,
            calls = self.results.iter().filter(|snp| snp.track_id == track_id).count(),
            windows = self.windows_done,
            skipped = self.windows_skipped,
            "snp detection finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IntervalRequest;
    use crate::genomics::{CoverageManager, Difference, ReadClass, Strand};
    use crate::store::MemoryStore;

    fn batch(from: u32, to: u32, diffs: Vec<Difference>) -> CoverageBatch {
        let mut coverage = CoverageManager::new(from, to);
        coverage.add_range(from, to, ReadClass::SinglePerfectMatch, Strand::Forward, 10);
        CoverageBatch {
            request: IntervalRequest {
                track_id: 1,
                chrom_id: 1,
                from,
                to,
            },
            coverage,
            diffs,
            gaps: Vec::new(),
        }
    }

    fn detection(store: MemoryStore) -> SnpDetection<MemoryStore> {
        let config = SnpConfig::default().with_codon_translation(false);
        SnpDetection::new(Arc::new(store), config)
    }

    #[test]
    fn unreadable_reference_skips_only_that_window() {
        let store = MemoryStore::new().with_chromosome(1, "chr1", b"AAAAAAAAAA");
        store.fail_next_sequence_reads(1);
        let mut detection = detection(store);

        detection
            .on_batch(&batch(1, 5, vec![Difference::new(3, b'C', 8)]))
            .unwrap();
        detection
            .on_batch(&batch(6, 10, vec![Difference::new(7, b'G', 8)]))
            .unwrap();
        detection.on_finished(1).unwrap();

        assert_eq!(detection.windows_skipped(), 1);
        let positions: Vec<u32> = detection.results().iter().map(|snp| snp.position).collect();
        assert_eq!(positions, vec![7]);
    }

    #[test]
    fn stopped_detection_discards_batches() {
        let store = MemoryStore::new().with_chromosome(1, "chr1", b"AAAAAAAAAA");
        let stop = Arc::new(AtomicBool::new(false));
        let mut detection = detection(store).with_stop_flag(Arc::clone(&stop));

        detection
            .on_batch(&batch(1, 5, vec![Difference::new(3, b'C', 8)]))
            .unwrap();
        stop.store(true, Ordering::SeqCst);
        detection
            .on_batch(&batch(6, 10, vec![Difference::new(7, b'G', 8)]))
            .unwrap();

        assert_eq!(detection.windows_done(), 1);
        assert_eq!(detection.into_results().len(), 1);
    }
}


