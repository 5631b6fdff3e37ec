//! The oracle-to-decompiler address-overlap join: matches DWARF function ranges against a
//! decompiler function interval index.

use std::collections::HashMap;

use reforge_common::{JoinDecompileThresholds, Verdict};
use reforge_decomp::DecompFunction;
use reforge_dwarf_oracle::DwarfFunction;
use serde::{Deserialize, Serialize};

use crate::dwarf_ts::{AlignmentPair, AlignmentVerdict};

/// A frozen set of init/fini/compiler-auxiliary symbol names, never joined as ordinary user
/// functions.
const AUX_FUNCTION_NAMES: &[&str] = &[
    "_start",
    "__libc_csu_init",
    "__libc_csu_fini",
    "_init",
    "_fini",
    "register_tm_clones",
    "deregister_tm_clones",
    "frame_dummy",
    "__do_global_dtors_aux",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinKind {
    JoinedStrong,
    JoinedWeak,
    MultiMatch,
    NoMatch,
    NoRange,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoiseFlags {
    pub is_external_block: bool,
    pub is_thunk: bool,
    pub is_aux_function: bool,
    pub is_import_proxy: bool,
}

impl NoiseFlags {
    pub fn any(&self) -> bool {
        self.is_external_block || self.is_thunk || self.is_aux_function || self.is_import_proxy
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinedFunctionRow {
    pub dwarf_function_id: String,
    pub dwarf_function_name: Option<String>,
    pub decompiler_entry_va: Option<u64>,
    pub pc_overlap_ratio: f64,
    pub overlap_bytes: u64,
    pub total_dwarf_range_bytes: u64,
    pub join_kind: JoinKind,
    pub fat_function_multi_dwarf: bool,
    pub fat_function_count: u32,
    pub noise: NoiseFlags,
    pub is_high_confidence: bool,
}

struct Candidate<'a> {
    function: &'a DecompFunction,
    overlap_bytes: u64,
}

fn overlap_len(a_begin: u64, a_end: u64, b_begin: u64, b_end: u64) -> u64 {
    let begin = a_begin.max(b_begin);
    let end = a_end.min(b_end);
    end.saturating_sub(begin)
}

fn is_aux_function(name: Option<&str>) -> bool {
    name.is_some_and(|n| AUX_FUNCTION_NAMES.contains(&n))
}

/// Joins every DWARF function in `dwarf_functions` against the decompiler function index built
/// from `decomp_functions`. DWARF functions with no defined ranges get `NO_RANGE` rather than
/// being force-joined.
///
/// `alignment_pairs` is the DWARF-to-tree-sitter join's output for the same binary, keyed by
/// DWARF function id, so the high-confidence gate can see whether a function was also a clean
/// source-level match.
pub fn join_all(
    dwarf_functions: &[DwarfFunction],
    decomp_functions: &[DecompFunction],
    alignment_pairs: &[AlignmentPair],
    thresholds: &JoinDecompileThresholds,
) -> Vec<JoinedFunctionRow> {
    let alignment_by_id: HashMap<&str, &AlignmentPair> = alignment_pairs
        .iter()
        .map(|pair| (pair.dwarf_function_id.as_str(), pair))
        .collect();

    let mut match_counts: HashMap<u64, u32> = HashMap::new();
    let mut rows = Vec::with_capacity(dwarf_functions.len());

    for dwarf_fn in dwarf_functions {
        let alignment = alignment_by_id.get(dwarf_fn.id.as_str()).copied();
        let row = join_one(dwarf_fn, decomp_functions, alignment, thresholds);
        if let Some(va) = row.decompiler_entry_va {
            *match_counts.entry(va).or_insert(0) += 1;
        }
        rows.push(row);
    }

    for row in &mut rows {
        if let Some(va) = row.decompiler_entry_va {
            let count = match_counts.get(&va).copied().unwrap_or(1);
            row.fat_function_multi_dwarf = count > 1;
            row.fat_function_count = count;
        }
    }

    rows
}

fn join_one(
    dwarf_fn: &DwarfFunction,
    decomp_functions: &[DecompFunction],
    alignment: Option<&AlignmentPair>,
    thresholds: &JoinDecompileThresholds,
) -> JoinedFunctionRow {
    if dwarf_fn.ranges.is_empty() {
        return JoinedFunctionRow {
            dwarf_function_id: dwarf_fn.id.clone(),
            dwarf_function_name: dwarf_fn.name.clone(),
            decompiler_entry_va: None,
            pc_overlap_ratio: 0.0,
            overlap_bytes: 0,
            total_dwarf_range_bytes: 0,
            join_kind: JoinKind::NoRange,
            fat_function_multi_dwarf: false,
            fat_function_count: 0,
            noise: NoiseFlags {
                is_external_block: false,
                is_thunk: false,
                is_aux_function: false,
                is_import_proxy: false,
            },
            is_high_confidence: false,
        };
    }

    let total_dwarf_range_bytes = dwarf_fn.total_range_bytes;
    let low_pc = dwarf_fn.ranges.iter().map(|r| r.begin).min().unwrap_or(0);

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for function in decomp_functions {
        let (Some(body_start), Some(body_end)) = (function.body_start_va, function.body_end_va)
        else {
            continue;
        };
        let overlap_bytes: u64 = dwarf_fn
            .ranges
            .iter()
            .map(|r| overlap_len(r.begin, r.end, body_start, body_end))
            .sum();
        if overlap_bytes > 0 {
            candidates.push(Candidate {
                function,
                overlap_bytes,
            });
        }
    }

    if candidates.is_empty() {
        return JoinedFunctionRow {
            dwarf_function_id: dwarf_fn.id.clone(),
            dwarf_function_name: dwarf_fn.name.clone(),
            decompiler_entry_va: None,
            pc_overlap_ratio: 0.0,
            overlap_bytes: 0,
            total_dwarf_range_bytes,
            join_kind: JoinKind::NoMatch,
            fat_function_multi_dwarf: false,
            fat_function_count: 0,
            noise: NoiseFlags {
                is_external_block: false,
                is_thunk: false,
                is_aux_function: false,
                is_import_proxy: false,
            },
            is_high_confidence: false,
        };
    }

    candidates.sort_by(|a, b| {
        b.overlap_bytes
            .cmp(&a.overlap_bytes)
            .then_with(|| {
                let da = a.function.entry_va.abs_diff(low_pc);
                let db = b.function.entry_va.abs_diff(low_pc);
                da.cmp(&db)
            })
            .then_with(|| a.function.is_thunk.cmp(&b.function.is_thunk))
            .then_with(|| a.function.is_external.cmp(&b.function.is_external))
    });

    let best = &candidates[0];
    let pc_overlap_ratio = if total_dwarf_range_bytes > 0 {
        best.overlap_bytes as f64 / total_dwarf_range_bytes as f64
    } else {
        0.0
    };

    let multi_match = candidates.len() > 1
        && candidates[1].overlap_bytes as f64
            >= best.overlap_bytes as f64 * (1.0 - thresholds.multi_match_slack);

    let join_kind = if multi_match {
        JoinKind::MultiMatch
    } else if pc_overlap_ratio >= thresholds.strong_ratio {
        JoinKind::JoinedStrong
    } else if pc_overlap_ratio >= thresholds.weak_ratio {
        JoinKind::JoinedWeak
    } else {
        JoinKind::NoMatch
    };

    let noise = NoiseFlags {
        is_external_block: best.function.is_external,
        is_thunk: best.function.is_thunk,
        is_aux_function: is_aux_function(best.function.name.as_deref()),
        is_import_proxy: best.function.is_thunk && best.function.is_external,
    };

    let has_fatal_warning = best
        .function
        .warnings
        .iter()
        .any(|w| w.is_fatal());

    let alignment_is_clean_match = alignment.is_some_and(|pair| {
        pair.verdict == AlignmentVerdict::Match
            && pair.candidates.len() == 1
            && pair.best.as_ref().is_some_and(|b| b.overlap_ratio == 1.0)
    });

    let is_high_confidence = dwarf_fn.verdict == Verdict::Accept
        && alignment_is_clean_match
        && join_kind == JoinKind::JoinedStrong
        && !noise.any()
        && best.function.cfg_completeness != reforge_decomp::CfgCompleteness::Low
        && !has_fatal_warning;

    JoinedFunctionRow {
        dwarf_function_id: dwarf_fn.id.clone(),
        dwarf_function_name: dwarf_fn.name.clone(),
        decompiler_entry_va: Some(best.function.entry_va),
        pc_overlap_ratio,
        overlap_bytes: best.overlap_bytes,
        total_dwarf_range_bytes,
        join_kind,
        fat_function_multi_dwarf: false,
        fat_function_count: 0,
        noise,
        is_high_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwarf_ts::{AlignmentReason, CandidateScore};
    use reforge_decomp::{CfgCompleteness, DecompFunction};
    use reforge_dwarf_oracle::{DeclTuple, Segment};
    use reforge_common::Verdict;

    fn clean_match(dwarf_function_id: &str) -> AlignmentPair {
        let score = CandidateScore {
            ts_func_id: "main.i:0:10:hash".to_string(),
            tu_path: "main.i".to_string(),
            overlap_count: 1,
            overlap_ratio: 1.0,
            context_hash: "hash".to_string(),
        };
        AlignmentPair {
            dwarf_function_id: dwarf_function_id.to_string(),
            dwarf_function_name: None,
            dwarf_decl: DeclTuple {
                file: None,
                line: None,
                column: None,
                comp_dir: None,
                missing_reason: None,
            },
            dwarf_verdict: Verdict::Accept,
            total_count: 1,
            gap_count: 0,
            candidates: vec![score.clone()],
            best: Some(score),
            verdict: AlignmentVerdict::Match,
            reasons: vec![AlignmentReason::UniqueBest],
        }
    }

    fn dwarf_function(name: &str, begin: u64, end: u64) -> DwarfFunction {
        DwarfFunction {
            id: format!("0x0:{begin:#x}"),
            name: Some(name.to_string()),
            ranges: vec![Segment { begin, end }],
            total_range_bytes: end - begin,
            line_row_multiset: Vec::new(),
            n_line_rows: 0,
            dominant_file: None,
            dominant_file_ratio: 0.0,
            decl: DeclTuple {
                file: None,
                line: None,
                column: None,
                comp_dir: None,
                missing_reason: None,
            },
            verdict: Verdict::Accept,
            reject_reasons: Vec::new(),
            warn_reasons: Vec::new(),
        }
    }

    fn decomp_function(entry_va: u64, start: u64, end: u64) -> DecompFunction {
        DecompFunction {
            entry_va,
            body_start_va: Some(start),
            body_end_va: Some(end),
            instruction_count: None,
            decompiled_text: None,
            name: Some("f".to_string()),
            is_thunk: false,
            is_external: false,
            variables: Vec::new(),
            blocks: Vec::new(),
            calls: Vec::new(),
            warnings: Vec::new(),
            verdict: Verdict::Accept,
            cfg_completeness: CfgCompleteness::High,
        }
    }

    #[test]
    fn full_overlap_is_joined_strong_and_high_confidence() {
        let dwarf_fn = dwarf_function("main", 100, 200);
        let alignment = clean_match(&dwarf_fn.id);
        let decomp_fn = decomp_function(100, 100, 200);
        let thresholds = JoinDecompileThresholds::default();
        let rows = join_all(&[dwarf_fn], &[decomp_fn], &[alignment], &thresholds);
        assert_eq!(rows[0].join_kind, JoinKind::JoinedStrong);
        assert!(rows[0].is_high_confidence);
    }

    #[test]
    fn strong_join_without_a_clean_alignment_is_not_high_confidence() {
        let dwarf_fn = dwarf_function("main", 100, 200);
        let decomp_fn = decomp_function(100, 100, 200);
        let thresholds = JoinDecompileThresholds::default();
        let rows = join_all(&[dwarf_fn], &[decomp_fn], &[], &thresholds);
        assert_eq!(rows[0].join_kind, JoinKind::JoinedStrong);
        assert!(!rows[0].is_high_confidence);
    }

    #[test]
    fn no_range_dwarf_function_is_never_force_joined() {
        let mut dwarf_fn = dwarf_function("f", 0, 0);
        dwarf_fn.ranges.clear();
        let decomp_fn = decomp_function(100, 100, 200);
        let thresholds = JoinDecompileThresholds::default();
        let rows = join_all(&[dwarf_fn], &[decomp_fn], &[], &thresholds);
        assert_eq!(rows[0].join_kind, JoinKind::NoRange);
    }

    #[test]
    fn no_overlap_is_no_match() {
        let dwarf_fn = dwarf_function("f", 0, 50);
        let decomp_fn = decomp_function(1000, 1000, 1050);
        let thresholds = JoinDecompileThresholds::default();
        let rows = join_all(&[dwarf_fn], &[decomp_fn], &[], &thresholds);
        assert_eq!(rows[0].join_kind, JoinKind::NoMatch);
    }
}
