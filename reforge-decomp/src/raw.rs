//! Deserialization types for the decompiler's newline-delimited JSON contract.
//!
//! Unresolvable fields are explicit nulls in the decompiler's output, never omitted, so every
//! field here is `Option<T>` rather than relying on `serde`'s missing-field defaulting.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawStorageClass {
    Stack,
    Register,
    Memory,
    Unique,
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawVariable {
    pub name: Option<String>,
    pub storage_class: RawStorageClass,
    /// Stack offset, register name, or memory address, interpreted per `storage_class`.
    pub storage_detail: Option<String>,
    pub type_string: Option<String>,
    pub access_sites: Vec<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawBlock {
    pub start_va: u64,
    pub end_va: u64,
    pub successors: Vec<u64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawCallKind {
    Direct,
    Indirect,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawCall {
    pub callsite_va: u64,
    pub kind: RawCallKind,
    pub callee_va: Option<u64>,
    pub callee_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawFunctionRecord {
    pub entry_va: u64,
    pub body_start_va: Option<u64>,
    pub body_end_va: Option<u64>,
    pub instruction_count: Option<u64>,
    pub decompiled_text: Option<String>,
    pub variables: Vec<RawVariable>,
    pub blocks: Vec<RawBlock>,
    pub calls: Vec<RawCall>,
    pub warnings: Vec<String>,
    pub is_thunk: bool,
    pub is_external: bool,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawSummaryRecord {
    pub image_base: u64,
    pub tool_version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "snake_case")]
pub enum RawLine {
    Function(RawFunctionRecord),
    Summary(RawSummaryRecord),
}

#[derive(Debug, thiserror::Error)]
pub enum NdjsonParseError {
    #[error("failed to parse decompiler output as newline-delimited JSON")]
    Json(#[from] serde_json::Error),
    #[error("decompiler dump has no summary record")]
    MissingSummary,
}

/// Parses one NDJSON-formatted decompiler dump into its function records and the trailing
/// summary record. Fails if the dump has no summary line rather than fabricating one, since a
/// missing summary means the image base used to rebase every address is unknown.
pub fn parse_ndjson(text: &str) -> Result<(Vec<RawFunctionRecord>, RawSummaryRecord), NdjsonParseError> {
    let mut functions = Vec::new();
    let mut summary = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawLine>(line)? {
            RawLine::Function(record) => functions.push(record),
            RawLine::Summary(record) => summary = Some(record),
        }
    }

    summary
        .map(|summary| (functions, summary))
        .ok_or(NdjsonParseError::MissingSummary)
}
