//! Output shapes: per-TU parse results and per-function records with their verdicts.

use reforge_common::{Sha256Hex, Verdict};
use serde::{Deserialize, Serialize};

use crate::functions::Span;
use crate::recipes::ExtractionRecipe;
use crate::structural::StructuralNode;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TuRejectReason {
    TuParseError,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionRejectReason {
    TuParseError,
    InvalidSpan,
    MissingFunctionName,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionWarnReason {
    DuplicateFunctionName,
    DeepNesting,
    AnonymousAggregatePresent,
    NonstandardExtensionPattern,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParseErrorRecord {
    pub byte: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpanRecord {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl From<&Span> for SpanRecord {
    fn from(span: &Span) -> Self {
        SpanRecord {
            start_byte: span.start_byte,
            end_byte: span.end_byte,
            start_line: span.start_line,
            end_line: span.end_line,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TsFunctionRecord {
    pub ts_func_id: String,
    pub tu_path: String,
    pub name: Option<String>,
    pub span: SpanRecord,
    pub signature_span: Option<SpanRecord>,
    pub body_span: Option<SpanRecord>,
    pub raw_text_hash: Sha256Hex,
    pub context_hash: Sha256Hex,
    pub structural_nodes: Vec<StructuralNode>,
    pub recipes: Vec<ExtractionRecipe>,
    pub verdict: Verdict,
    pub reject_reasons: Vec<FunctionRejectReason>,
    pub warn_reasons: Vec<FunctionWarnReason>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TsTuReport {
    pub tu_path: String,
    pub tu_hash: Sha256Hex,
    pub parser_name: String,
    pub grammar_version: usize,
    pub verdict: Verdict,
    pub reject_reason: Option<TuRejectReason>,
    pub parse_errors: Vec<ParseErrorRecord>,
    pub functions: Vec<TsFunctionRecord>,
}
