//! Fixture-backed integration test for the tree-sitter oracle, mirroring
//! `symbolic-debuginfo/tests/test_objects.rs`'s fixture-file-plus-snapshot shape.

use std::path::PathBuf;

use reforge_common::{TsThresholds, Verdict};
use similar_asserts::assert_eq;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn two_functions_extracted_with_expected_shape() {
    let source = std::fs::read(fixture("two_functions.i")).expect("fixture must exist");
    let thresholds = TsThresholds::default();

    let report = reforge_ts_oracle::run_tu("two_functions.i", &source, &thresholds);

    assert_eq!(report.verdict, Verdict::Accept);
    assert_eq!(report.reject_reason, None);
    assert!(report.parse_errors.is_empty());
    assert_eq!(report.functions.len(), 2);

    let names: Vec<_> = report
        .functions
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, vec![Some("add".to_string()), Some("helper".to_string())]);

    for function in &report.functions {
        assert_eq!(function.verdict, Verdict::Accept);
        assert!(function.reject_reasons.is_empty());
    }
}

/// Extraction is a pure function of the TU's bytes: re-running over the same fixture must
/// produce byte-identical JSON, including the content/raw-text hashes.
#[test]
fn extraction_is_deterministic_across_runs() {
    let source = std::fs::read(fixture("two_functions.i")).expect("fixture must exist");
    let thresholds = TsThresholds::default();

    let first = reforge_ts_oracle::run_tu("two_functions.i", &source, &thresholds);
    let second = reforge_ts_oracle::run_tu("two_functions.i", &source, &thresholds);

    let first_json = serde_json::to_string_pretty(&first).unwrap();
    let second_json = serde_json::to_string_pretty(&second).unwrap();
    assert_eq!(first_json, second_json);
}
