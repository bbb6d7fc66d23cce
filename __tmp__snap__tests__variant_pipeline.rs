#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{config, coverage_records, detect, differences, gaps, reference_store, CHR1};
use vartrack::analysis::{
    AnalysisRunner, BatchObserver, ConnectorRegistry, RecordBatchSource, SnpDetection,
    TrackConnector, TrackJob, WindowPlan,
};
use vartrack::genomics::{ReadClass, ReadClassFilter, SequenceComparison};
use vartrack::stats::{DistributionKind, StatKey};
use vartrack::{AnalysisError, MemoryStore, StatsCollector};

#[test]
fn windows_are_called_and_annotated() {
    let calls = detect(config());

    let keys: Vec<(u32, u32, SequenceComparison)> = calls
        .iter()
        .map(|snp| (snp.position, snp.gap_order, snp.comparison))
        .collect();
    assert_eq!(
        keys,
        vec![
            (2, 0, SequenceComparison::Substitution),
            (12, 0, SequenceComparison::Deletion),
            (14, 1, SequenceComparison::Insertion),
            (26, 0, SequenceComparison::Substitution),
        ]
    );

    let substitution = &calls[0];
    assert_eq!((substitution.base, substitution.reference_base), (b'C', b'T'));
    assert_eq!(substitution.codons.len(), 1);
    assert_eq!(substitution.codons[0].reference_triplet, "ATG");
    assert_eq!(substitution.codons[0].variant_triplet, "ACG");
    assert_eq!(substitution.codons[0].effect, SequenceComparison::Missense);
    assert_eq!(substitution.codons[0].feature_id, 1);

    // reverse-strand record reported as the forward base, outside any gene
    let reverse = &calls[3];
    assert_eq!(reverse.base, b'C');
    assert_eq!(reverse.coverage, 12);
    assert!(reverse.codons.is_empty());
    assert_eq!(reverse.average_base_quality, None);
}

#[test]
fn codon_translation_can_be_disabled() {
    let calls = detect(config().with_codon_translation(false));
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|snp| snp.codons.is_empty()));
}

#[test]
fn frequency_threshold_drops_weak_calls() {
    let calls = detect(config().with_min_percentage(55.0));
    let positions: Vec<u32> = calls.iter().map(|snp| snp.position).collect();
    assert_eq!(positions, vec![2, 12]);
}

#[test]
fn excluded_read_classes_are_not_counted() {
    let filter = ReadClassFilter::all().excluding(ReadClass::SinglePerfectMatch);
    let calls = detect(config().with_read_classes(filter));
    assert!(calls.is_empty());
}

#[test]
fn statistics_are_collected_alongside_detection() {
    let reference = Arc::new(reference_store());
    let config = config();
    let plan = WindowPlan::new(CHR1.len() as u32, config.interval_length).unwrap();
    let source = RecordBatchSource::new(1, 1, &plan, coverage_records(), differences(), gaps());

    let runner = AnalysisRunner::new();
    let mut detection = SnpDetection::new(reference, config).with_stop_flag(runner.stop_handle());
    let mut collector = StatsCollector::new(1);
    let summary = runner
        .run(vec![TrackJob {
            source: Box::new(source),
            observers: vec![
                &mut detection as &mut dyn BatchObserver,
                &mut collector as &mut dyn BatchObserver,
            ],
        }])
        .unwrap();
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.tracks_finished, 1);

    let mut store = MemoryStore::new();
    let stats = collector.finish(&mut store).unwrap();
    assert_eq!(stats.value(StatKey::CoveredBasesPerfect), Some(30));
    assert_eq!(stats.value(StatKey::CoveredBasesCommon), Some(30));
    assert_eq!(store.statistic(1, "COVERED_COMMON_BASES"), Some(30));

    // depth 10 -> 12 across the window border at 20/21
    let increases = store
        .distribution_bins(1, DistributionKind::CoverageIncrease.id())
        .unwrap();
    assert_eq!(increases[0], 1);
    let percent = store
        .distribution_bins(1, DistributionKind::CoverageIncreasePercent.id())
        .unwrap();
    assert_eq!(percent[1], 1);
    assert!(store
        .distribution_bins(1, DistributionKind::ReadLength.id())
        .is_none());

    assert_eq!(detection.windows_done(), 3);
}

#[test]
fn tracks_of_one_reference_run_concurrently() {
    let mut registry = ConnectorRegistry::new();
    registry.register_reference(7, reference_store());
    registry
        .register_track(TrackConnector::new(1, 7, "sample A"))
        .unwrap();
    registry
        .register_track(TrackConnector::new(2, 7, "sample B"))
        .unwrap();

    let config = config();
    let plan = WindowPlan::new(CHR1.len() as u32, config.interval_length).unwrap();
    let runner = AnalysisRunner::new();
    let mut detections: Vec<SnpDetection<MemoryStore>> = registry
        .tracks()
        .iter()
        .map(|track| {
            let reference = registry.reference_for_track(track.track_id).unwrap();
            SnpDetection::new(reference, config.clone()).with_stop_flag(runner.stop_handle())
        })
        .collect();

    let jobs: Vec<TrackJob<'_>> = detections
        .iter_mut()
        .zip([1u32, 2])
        .map(|(detection, track_id)| TrackJob {
            source: Box::new(RecordBatchSource::new(
                track_id,
                1,
                &plan,
                coverage_records(),
                differences(),
                gaps(),
            )),
            observers: vec![detection as &mut dyn BatchObserver],
        })
        .collect();
    let summary = runner.run(jobs).unwrap();
    assert_eq!(summary.tracks_finished, 2);

    let second = detections.pop().unwrap().into_results();
    let first = detections.pop().unwrap().into_results();
    assert_eq!(first.len(), second.len());
    assert!(first.iter().all(|snp| snp.track_id == 1));
    assert!(second.iter().all(|snp| snp.track_id == 2));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!((a.position, a.gap_order, a.base), (b.position, b.gap_order, b.base));
    }
}

#[test]
fn unregistered_tracks_are_rejected() {
    let mut registry: ConnectorRegistry<MemoryStore> = ConnectorRegistry::new();
    assert!(matches!(
        registry.register_track(TrackConnector::new(1, 3, "orphan")),
        Err(AnalysisError::UnknownReference(3))
    ));
    assert!(matches!(
        registry.reference_for_track(9),
        Err(AnalysisError::UnknownTrack(9))
    ));
}

