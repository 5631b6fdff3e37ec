//! Fixture-backed integration test for both join stages, mirroring
//! `symbolic-debuginfo/tests/test_objects.rs`'s fixture-plus-snapshot shape: a small `.i` fixture
//! feeds the DWARF-to-tree-sitter join, and its result feeds the oracle-to-decompiler join in
//! turn, the same order a caller runs them in.

use std::path::PathBuf;

use reforge_common::{
    ExcludedPrefixes, JoinDecompileThresholds, JoinDwarfTsThresholds, Sha256Hex, Verdict,
};
use reforge_decomp::{CfgCompleteness, DecompFunction, DecompReport};
use reforge_dwarf_oracle::{DeclTuple, DwarfFunction, DwarfReport, LineRowCount, Segment};
use reforge_join::{AlignmentVerdict, JoinKind, OriginMap, TuInput};
use reforge_ts_oracle::{SpanRecord, TsFunctionRecord, TsTuReport};
use similar_asserts::assert_eq;

fn fixture_text() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.i");
    std::fs::read_to_string(path).expect("fixture must exist")
}

fn dwarf_report() -> DwarfReport {
    let binary_sha256 = Sha256Hex::of_bytes(b"fixture binary");
    let dwarf_fn = DwarfFunction {
        id: "0x0:0x10".to_string(),
        name: Some("add".to_string()),
        ranges: vec![Segment {
            begin: 0x1000,
            end: 0x1020,
        }],
        total_range_bytes: 0x20,
        line_row_multiset: vec![
            LineRowCount {
                file: "sample.c".to_string(),
                line: 2,
                count: 1,
            },
            LineRowCount {
                file: "sample.c".to_string(),
                line: 3,
                count: 1,
            },
        ],
        n_line_rows: 2,
        dominant_file: Some("sample.c".to_string()),
        dominant_file_ratio: 1.0,
        decl: DeclTuple {
            file: Some("sample.c".to_string()),
            line: Some(1),
            column: Some(1),
            comp_dir: Some("/src".to_string()),
            missing_reason: None,
        },
        verdict: Verdict::Accept,
        reject_reasons: Vec::new(),
        warn_reasons: Vec::new(),
    };
    DwarfReport {
        header: reforge_common::OutputHeader::new("default", binary_sha256),
        verdict: Verdict::Accept,
        reject_reason: None,
        functions: vec![dwarf_fn],
    }
}

fn ts_report() -> TsTuReport {
    let record = TsFunctionRecord {
        ts_func_id: "sample.i:0:60:hash".to_string(),
        tu_path: "sample.i".to_string(),
        name: Some("add".to_string()),
        span: SpanRecord {
            start_byte: 0,
            end_byte: 60,
            start_line: 1,
            end_line: 3,
        },
        signature_span: Some(SpanRecord {
            start_byte: 0,
            end_byte: 23,
            start_line: 1,
            end_line: 1,
        }),
        body_span: Some(SpanRecord {
            start_byte: 23,
            end_byte: 60,
            start_line: 1,
            end_line: 3,
        }),
        raw_text_hash: Sha256Hex::of_bytes(b"int add(int a, int b) {\n    return a + b;\n}"),
        context_hash: Sha256Hex::of_bytes(b"add-context"),
        structural_nodes: Vec::new(),
        recipes: Vec::new(),
        verdict: Verdict::Accept,
        reject_reasons: Vec::new(),
        warn_reasons: Vec::new(),
    };
    TsTuReport {
        tu_path: "sample.i".to_string(),
        tu_hash: Sha256Hex::of_bytes(fixture_text().as_bytes()),
        parser_name: reforge_ts_oracle::PARSER_NAME.to_string(),
        grammar_version: reforge_ts_oracle::grammar_version(),
        verdict: Verdict::Accept,
        reject_reason: None,
        parse_errors: Vec::new(),
        functions: vec![record],
    }
}

fn decomp_report(binary_sha256: Sha256Hex) -> DecompReport {
    let function = DecompFunction {
        entry_va: 0x1000,
        body_start_va: Some(0x1000),
        body_end_va: Some(0x1020),
        instruction_count: Some(4),
        decompiled_text: Some("int add(int a, int b) { return a + b; }".to_string()),
        name: Some("add".to_string()),
        is_thunk: false,
        is_external: false,
        variables: Vec::new(),
        blocks: Vec::new(),
        calls: Vec::new(),
        warnings: Vec::new(),
        verdict: Verdict::Accept,
        cfg_completeness: CfgCompleteness::High,
    };
    DecompReport {
        header: reforge_common::OutputHeader::new("default", binary_sha256),
        image_base: 0,
        tool_version: "decomp-fixture-1.0".to_string(),
        functions: vec![function],
    }
}

#[test]
fn dwarf_to_ts_then_oracles_to_decompile_joins_cleanly() {
    let excluded_prefixes = ExcludedPrefixes::default();
    let origin_map = OriginMap::build(&fixture_text(), &excluded_prefixes);
    let ts_report = ts_report();
    let dwarf_report = dwarf_report();
    let binary_sha256 = dwarf_report.header.binary_sha256;

    let tu_inputs = vec![TuInput {
        tu_path: "sample.i".to_string(),
        report: &ts_report,
        origin_map: Some(&origin_map),
    }];

    let dwarf_ts_report = reforge_join::join_dwarf_to_ts(
        &dwarf_report,
        "default",
        &tu_inputs,
        &JoinDwarfTsThresholds::default(),
    );
    assert_eq!(dwarf_ts_report.pairs.len(), 1);
    assert_eq!(dwarf_ts_report.pairs[0].verdict, AlignmentVerdict::Match);
    assert_eq!(dwarf_ts_report.pairs[0].candidates.len(), 1);
    assert_eq!(dwarf_ts_report.pairs[0].best.as_ref().unwrap().overlap_ratio, 1.0);

    let decomp_report = decomp_report(binary_sha256);
    let oracle_decompile_report = reforge_join::join_oracles_to_decompile(
        binary_sha256,
        "default",
        &dwarf_report,
        &decomp_report,
        &dwarf_ts_report,
        &JoinDecompileThresholds::default(),
    )
    .unwrap();

    assert_eq!(oracle_decompile_report.rows.len(), 1);
    let row = &oracle_decompile_report.rows[0];
    assert_eq!(row.join_kind, JoinKind::JoinedStrong);
    assert!(row.is_high_confidence);
}

/// Both join stages are pure functions of their inputs: re-running over the same fixtures must
/// produce byte-identical JSON.
#[test]
fn joins_are_deterministic_across_runs() {
    let excluded_prefixes = ExcludedPrefixes::default();
    let origin_map = OriginMap::build(&fixture_text(), &excluded_prefixes);
    let ts_report = ts_report();
    let dwarf_report = dwarf_report();

    let tu_inputs = vec![TuInput {
        tu_path: "sample.i".to_string(),
        report: &ts_report,
        origin_map: Some(&origin_map),
    }];

    let first = reforge_join::join_dwarf_to_ts(
        &dwarf_report,
        "default",
        &tu_inputs,
        &JoinDwarfTsThresholds::default(),
    );
    let second = reforge_join::join_dwarf_to_ts(
        &dwarf_report,
        "default",
        &tu_inputs,
        &JoinDwarfTsThresholds::default(),
    );

    assert_eq!(
        serde_json::to_string_pretty(&first).unwrap(),
        serde_json::to_string_pretty(&second).unwrap()
    );
}
