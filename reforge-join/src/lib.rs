//! Bridges DWARF, tree-sitter, and decompiler coordinates.
//!
//! Two independent join stages live here: [`join_dwarf_to_ts`] aligns DWARF functions to their
//! tree-sitter counterparts via preprocessor line-directive provenance, and
//! [`join_oracles_to_decompile`] matches DWARF function ranges against decompiler-reported
//! function bodies by virtual-address overlap. Both stages are additive: every DWARF function
//! gets a row in the output, regardless of match quality.

mod address_overlap;
mod dwarf_ts;
mod origin_map;
mod report;

use reforge_common::{JoinDecompileThresholds, JoinDwarfTsThresholds, OutputHeader, Sha256Hex};
use reforge_decomp::DecompReport;
use reforge_dwarf_oracle::DwarfReport;
use reforge_ts_oracle::TsTuReport;
use thiserror::Error;

pub use address_overlap::{JoinKind, JoinedFunctionRow, NoiseFlags};
pub use dwarf_ts::{align, AlignmentPair, AlignmentReason, AlignmentVerdict, CandidateScore, TsCandidate};
pub use origin_map::{Origin, OriginMap};
pub use report::{DwarfTsJoinReport, OracleDecompileJoinReport};

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("binary_sha256 mismatch across join inputs: expected {expected}, got {actual} from {source_name}")]
    BinarySha256Mismatch {
        expected: Sha256Hex,
        actual: Sha256Hex,
        source_name: &'static str,
    },
}

/// One translation unit's tree-sitter report plus the origin map built from its preprocessed
/// text, bundled so every candidate function in it can be scored against a DWARF function.
pub struct TuInput<'a> {
    pub tu_path: String,
    pub report: &'a TsTuReport,
    pub origin_map: Option<&'a OriginMap>,
}

/// Runs the DWARF-to-tree-sitter join for one binary across every translation unit's tree-sitter
/// report.
pub fn join_dwarf_to_ts(
    dwarf_report: &DwarfReport,
    profile_id: &str,
    tu_inputs: &[TuInput<'_>],
    thresholds: &JoinDwarfTsThresholds,
) -> DwarfTsJoinReport {
    let candidates: Vec<TsCandidate<'_>> = tu_inputs
        .iter()
        .flat_map(|tu| {
            tu.report
                .functions
                .iter()
                .map(move |record| TsCandidate {
                    record,
                    origin_map: tu.origin_map,
                })
        })
        .collect();

    let mut pairs: Vec<AlignmentPair> = dwarf_report
        .functions
        .iter()
        .map(|dwarf_fn| align(dwarf_fn, &candidates, thresholds))
        .collect();

    report::sort_pairs(&mut pairs);

    let matched = pairs
        .iter()
        .filter(|p| p.verdict == AlignmentVerdict::Match)
        .count();
    tracing::debug!(
        binary_sha256 = %dwarf_report.header.binary_sha256,
        total = pairs.len(),
        matched,
        "dwarf-to-tree-sitter join finished"
    );

    DwarfTsJoinReport {
        header: OutputHeader::new(profile_id, dwarf_report.header.binary_sha256),
        pairs,
    }
}

/// Runs the oracle-to-decompiler address-overlap join for one binary. Fails hard if the DWARF and
/// decompiler reports disagree on which binary produced them. Takes the DWARF-to-tree-sitter
/// alignment pairs for the same binary so the high-confidence gate can require a clean alignment
/// match, not just a clean address-overlap match.
pub fn join_oracles_to_decompile(
    binary_sha256: Sha256Hex,
    profile_id: &str,
    dwarf_report: &DwarfReport,
    decomp_report: &DecompReport,
    dwarf_ts_report: &DwarfTsJoinReport,
    thresholds: &JoinDecompileThresholds,
) -> Result<OracleDecompileJoinReport, JoinError> {
    if dwarf_report.header.binary_sha256 != binary_sha256 {
        let error = JoinError::BinarySha256Mismatch {
            expected: binary_sha256,
            actual: dwarf_report.header.binary_sha256,
            source_name: "dwarf_report",
        };
        tracing::error!(%error, "binary_sha256 mismatch");
        return Err(error);
    }
    if decomp_report.header.binary_sha256 != binary_sha256 {
        let error = JoinError::BinarySha256Mismatch {
            expected: binary_sha256,
            actual: decomp_report.header.binary_sha256,
            source_name: "decomp_report",
        };
        tracing::error!(%error, "binary_sha256 mismatch");
        return Err(error);
    }
    if dwarf_ts_report.header.binary_sha256 != binary_sha256 {
        let error = JoinError::BinarySha256Mismatch {
            expected: binary_sha256,
            actual: dwarf_ts_report.header.binary_sha256,
            source_name: "dwarf_ts_report",
        };
        tracing::error!(%error, "binary_sha256 mismatch");
        return Err(error);
    }

    let mut rows = address_overlap::join_all(
        &dwarf_report.functions,
        &decomp_report.functions,
        &dwarf_ts_report.pairs,
        thresholds,
    );
    report::sort_rows(&mut rows);

    tracing::debug!(binary_sha256 = %binary_sha256, rows = rows.len(), "oracle-to-decompiler join finished");

    Ok(OracleDecompileJoinReport {
        header: OutputHeader::new(profile_id, binary_sha256),
        rows,
    })
}
