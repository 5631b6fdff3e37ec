//! Normalized, rebased output shapes emitted by the reshape stage.

use reforge_common::{OutputHeader, Verdict};
use serde::{Deserialize, Serialize};

use crate::raw::RawCallKind;
use crate::warnings::{CfgCompleteness, DecompileWarning};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecompVariable {
    pub storage_key: String,
    pub name: Option<String>,
    pub type_string: Option<String>,
    pub access_sites: Vec<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CfgBlock {
    pub start_va: u64,
    pub end_va: u64,
    pub successors: Vec<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller_entry_va: u64,
    pub callsite_va: u64,
    pub kind: RawCallKind,
    pub callee_va: Option<u64>,
    pub callee_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecompFunction {
    pub entry_va: u64,
    pub body_start_va: Option<u64>,
    pub body_end_va: Option<u64>,
    pub instruction_count: Option<u64>,
    pub decompiled_text: Option<String>,
    pub name: Option<String>,
    pub is_thunk: bool,
    pub is_external: bool,
    pub variables: Vec<DecompVariable>,
    pub blocks: Vec<CfgBlock>,
    pub calls: Vec<CallRecord>,
    pub warnings: Vec<DecompileWarning>,
    pub verdict: Verdict,
    pub cfg_completeness: CfgCompleteness,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecompReport {
    #[serde(flatten)]
    pub header: OutputHeader,
    pub image_base: u64,
    pub tool_version: String,
    pub functions: Vec<DecompFunction>,
}
