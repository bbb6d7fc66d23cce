#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vartrack::analysis::{
    AnalysisRunner, BatchObserver, RecordBatchSource, SnpDetection, TrackJob, WindowPlan,
};
use vartrack::genomics::io::CoverageRecord;
use vartrack::genomics::{
    Difference, FeatureRecord, FeatureType, ReadClass, ReferenceGap, SnpRecord, Strand,
};
use vartrack::{MemoryStore, SnpConfig};

/// `ATG AAA CCC GGG TTT TAA GGG CCC ATG TAA`
pub const CHR1: &[u8] = b"ATGAAACCCGGGTTTTAAGGGCCCATGTAA";

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("VARTRACK_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set VARTRACK_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// Forward gene `geneA` over 1..=15 with one CDS child.
pub fn gene_features() -> Vec<FeatureRecord> {
    vec![
        FeatureRecord {
            id: 1,
            parent_id: None,
            chrom_id: 1,
            start: 1,
            stop: 15,
            strand: Strand::Forward,
            feature_type: FeatureType::Gene,
            locus: "geneA".to_string(),
        },
        FeatureRecord {
            id: 2,
            parent_id: Some(1),
            chrom_id: 1,
            start: 1,
            stop: 15,
            strand: Strand::Forward,
            feature_type: FeatureType::Cds,
            locus: "geneA-cds".to_string(),
        },
    ]
}

pub fn reference_store() -> MemoryStore {
    MemoryStore::new()
        .with_chromosome(1, "chr1", CHR1)
        .with_features(gene_features())
}

/// Forward depth 10 on 1..=20 and 12 on 21..=30.
pub fn coverage_records() -> Vec<CoverageRecord> {
    (1..=30)
        .map(|position| CoverageRecord {
            position,
            class: ReadClass::SinglePerfectMatch,
            forward: if position <= 20 { 10 } else { 12 },
            reverse: 0,
        })
        .collect()
}

pub fn differences() -> Vec<Difference> {
    vec![
        Difference::new(2, b'C', 8).with_qualities(30, 60),
        // majority agrees with the reference, never reported
        Difference::new(5, b'A', 6).with_qualities(30, 60),
        Difference::new(5, b'G', 2).with_qualities(30, 60),
        Difference::new(12, b'-', 6).with_qualities(25, 60),
        Difference::new(26, b'G', 5).on_strand(Strand::Reverse),
        Difference::new(28, b'G', 1),
    ]
}

pub fn gaps() -> Vec<ReferenceGap> {
    vec![ReferenceGap::new(14, b'A', 0, 5).with_qualities(20, 50)]
}

pub fn config() -> SnpConfig {
    SnpConfig::default()
        .with_min_mismatching_bases(5)
        .with_min_percentage(20.0)
        .with_interval_length(10)
}

/// Run detection over the fixture track and return the sorted calls.
pub fn detect(config: SnpConfig) -> Vec<SnpRecord> {
    let store = Arc::new(reference_store());
    let plan = WindowPlan::new(CHR1.len() as u32, config.interval_length).expect("valid plan");
    let source = RecordBatchSource::new(1, 1, &plan, coverage_records(), differences(), gaps());
    let runner = AnalysisRunner::new();
    let mut detection = SnpDetection::new(store, config).with_stop_flag(runner.stop_handle());
    runner
        .run(vec![TrackJob {
            source: Box::new(source),
            observers: vec![&mut detection as &mut dyn BatchObserver],
        }])
        .expect("run succeeds");
    detection.into_results()
}


