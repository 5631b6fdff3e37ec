//! Output shapes: the per-function record and the binary-level report.

use reforge_common::{OutputHeader, Verdict};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionRejectReason {
    DeclarationOnly,
    MissingRange,
    NoLineRowsInRange,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionWarnReason {
    MultiFileRange,
    SystemHeaderDominant,
    RangesFragmented,
    NameMissing,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineRowCount {
    pub file: String,
    pub line: u64,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeclTuple {
    pub file: Option<String>,
    pub line: Option<u64>,
    pub column: Option<u64>,
    pub comp_dir: Option<String>,
    pub missing_reason: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub begin: u64,
    pub end: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DwarfFunction {
    /// `cu_offset:die_offset`, the within-binary stable key used to sort and cross-reference this
    /// function from the join stages. Not stable across optimization levels.
    pub id: String,
    pub name: Option<String>,
    pub ranges: Vec<Segment>,
    pub total_range_bytes: u64,
    pub line_row_multiset: Vec<LineRowCount>,
    pub n_line_rows: u64,
    pub dominant_file: Option<String>,
    pub dominant_file_ratio: f64,
    pub decl: DeclTuple,
    pub verdict: Verdict,
    pub reject_reasons: Vec<FunctionRejectReason>,
    pub warn_reasons: Vec<FunctionWarnReason>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BinaryRejectReason {
    NotElfX8664,
    MissingDebugInfo,
    MissingDebugLine,
    SplitDwarfDetected,
    ParserCannotOpen,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DwarfReport {
    #[serde(flatten)]
    pub header: OutputHeader,
    pub verdict: Verdict,
    pub reject_reason: Option<BinaryRejectReason>,
    pub functions: Vec<DwarfFunction>,
}
