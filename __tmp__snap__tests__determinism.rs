#[path = "common/mod.rs"]
mod common;

use std::collections::HashSet;

use blake3::hash;
use common::{config, detect};
use vartrack::analysis::AnalysisRunner;
use vartrack::genomics::render_table;

#[test]
fn detection_is_deterministic() {
    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let calls = detect(config());
        let table = render_table(&calls).expect("rendering succeeds");
        fingerprints.insert(hash(table.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn window_length_does_not_change_calls() {
    // every split keeps quality-less records apart from the others
    let mut fingerprints = HashSet::new();
    for interval_length in [7, 10, 16, 20, 25] {
        let calls = detect(config().with_interval_length(interval_length));
        let table = render_table(&calls).expect("rendering succeeds");
        fingerprints.insert(hash(table.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "windowing changed the result table");
}

#[test]
fn channel_capacity_is_clamped() {
    let runner = AnalysisRunner::new().with_channel_capacity(0);
    let summary = runner.run(Vec::new()).expect("empty run succeeds");
    assert_eq!(summary.batches, 0);
    assert!(!summary.stopped);
}


