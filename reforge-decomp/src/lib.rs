//! Validates and reshapes a decompiler's raw newline-delimited JSON dump into the pipeline's
//! normalized function/variable/CFG/call records, rebasing every virtual address against the
//! summary record's image base.

mod raw;
mod report;
mod reshape;
mod storage;
mod warnings;

use reforge_common::{OutputHeader, Sha256Hex};
use thiserror::Error;

pub use raw::{
    parse_ndjson, NdjsonParseError, RawBlock, RawCall, RawCallKind, RawFunctionRecord, RawLine,
    RawStorageClass, RawSummaryRecord, RawVariable,
};
pub use report::{CallRecord, CfgBlock, DecompFunction, DecompReport, DecompVariable};
pub use storage::storage_key;
pub use warnings::{cfg_completeness, function_verdict, CfgCompleteness, DecompileWarning};

#[derive(Debug, Error)]
pub enum DecompReshapeError {
    #[error("failed to parse decompiler dump")]
    Parse(#[from] NdjsonParseError),
}

/// Parses and reshapes one binary's decompiler dump.
pub fn run(
    binary_sha256: Sha256Hex,
    profile_id: &str,
    ndjson_text: &str,
) -> Result<DecompReport, DecompReshapeError> {
    let (raw_functions, summary) = parse_ndjson(ndjson_text)?;
    tracing::debug!(
        binary_sha256 = %binary_sha256,
        function_count = raw_functions.len(),
        image_base = summary.image_base,
        tool_version = %summary.tool_version,
        "parsed decompiler dump"
    );

    let functions: Vec<_> = raw_functions
        .iter()
        .map(|raw| reshape::reshape_function(raw, summary.image_base))
        .collect();

    let rejected = functions
        .iter()
        .filter(|f| f.verdict == reforge_common::Verdict::Reject)
        .count();
    if rejected > 0 {
        tracing::warn!(binary_sha256 = %binary_sha256, rejected, "some decompiler functions rejected");
    }

    Ok(DecompReport {
        header: OutputHeader::new(profile_id, binary_sha256),
        image_base: summary.image_base,
        tool_version: summary.tool_version,
        functions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_and_summary_lines() {
        let ndjson = concat!(
            r#"{"_type":"function","entry_va":4198400,"body_start_va":4198400,"body_end_va":4198416,"instruction_count":4,"decompiled_text":"void f(void) {}","variables":[],"blocks":[],"calls":[],"warnings":[],"is_thunk":false,"is_external":false,"name":"f"}"#,
            "\n",
            r#"{"_type":"summary","image_base":4194304,"tool_version":"decomp-1.0"}"#,
        );
        let report = run(Sha256Hex::of_bytes(b"binary"), "default", ndjson).unwrap();
        assert_eq!(report.image_base, 4194304);
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].entry_va, 4198400 - 4194304);
    }
}
