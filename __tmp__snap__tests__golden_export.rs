#[path = "common/mod.rs"]
mod common;
use common::{assert_snapshot, config, detect};
use vartrack::genomics::render_table;

#[test]
fn pipeline_table_matches_golden() {
    let calls = detect(config());
    let actual = render_table(&calls).expect("table rendering should succeed");
    assert_snapshot("pipeline/calls.tsv", &actual);
}

#[test]
fn empty_result_renders_header_only() {
    let actual = render_table(&[]).expect("table rendering should succeed");
    assert_eq!(actual.lines().count(), 1);
    assert!(actual.starts_with("Position\tGap index\tTrack"));
}


