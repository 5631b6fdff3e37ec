//! Combined output shapes for both join stages, with the ordering guarantees callers can rely on
//! for byte-identical output across runs.

use reforge_common::OutputHeader;
use serde::{Deserialize, Serialize};

use crate::address_overlap::JoinedFunctionRow;
use crate::dwarf_ts::AlignmentPair;

/// Output of the DWARF-to-tree-sitter join for one binary. Pairs are ordered by DWARF function
/// id, the within-binary stable key the DWARF oracle assigns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DwarfTsJoinReport {
    #[serde(flatten)]
    pub header: OutputHeader,
    pub pairs: Vec<AlignmentPair>,
}

/// Output of the oracle-to-decompiler address-overlap join for one binary. Rows are ordered by
/// DWARF function id, matching `DwarfTsJoinReport::pairs`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleDecompileJoinReport {
    #[serde(flatten)]
    pub header: OutputHeader,
    pub rows: Vec<JoinedFunctionRow>,
}

pub(crate) fn sort_pairs(pairs: &mut [AlignmentPair]) {
    pairs.sort_by(|a, b| a.dwarf_function_id.cmp(&b.dwarf_function_id));
}

pub(crate) fn sort_rows(rows: &mut [JoinedFunctionRow]) {
    rows.sort_by(|a, b| a.dwarf_function_id.cmp(&b.dwarf_function_id));
}
