//! The DWARF-to-tree-sitter join: bridges binary and source coordinates via preprocessor
//! `#line` directives, scoring every candidate TS function against a DWARF function's line-row
//! multiset.

use std::collections::HashSet;

use reforge_common::{JoinDwarfTsThresholds, Verdict};
use reforge_dwarf_oracle::{DeclTuple, DwarfFunction, FunctionWarnReason as DwarfWarnReason};
use reforge_ts_oracle::TsFunctionRecord;
use serde::{Deserialize, Serialize};

use crate::origin_map::OriginMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlignmentVerdict {
    Match,
    Ambiguous,
    NoMatch,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlignmentReason {
    UniqueBest,
    HeaderReplicationCollision,
    NearTie,
    NoCandidates,
    NoOverlap,
    LowOverlapRatio,
    BelowMinOverlap,
    OriginMapMissing,
    MultiFileRangePropagated,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateScore {
    pub ts_func_id: String,
    pub tu_path: String,
    pub overlap_count: u64,
    pub overlap_ratio: f64,
    pub context_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlignmentPair {
    pub dwarf_function_id: String,
    pub dwarf_function_name: Option<String>,
    pub dwarf_decl: DeclTuple,
    pub dwarf_verdict: Verdict,
    pub total_count: u64,
    pub gap_count: u64,
    pub candidates: Vec<CandidateScore>,
    pub best: Option<CandidateScore>,
    pub verdict: AlignmentVerdict,
    pub reasons: Vec<AlignmentReason>,
}

/// One candidate TS function available for alignment, bundled with the origin map of its own TU
/// (a candidate from a `.i` file with no origin map at all is simply unable to be scored).
pub struct TsCandidate<'a> {
    pub record: &'a TsFunctionRecord,
    pub origin_map: Option<&'a OriginMap>,
}

fn candidate_source_lines(candidate: &TsCandidate<'_>) -> Option<HashSet<(String, u64)>> {
    let origin_map = candidate.origin_map?;
    let span = &candidate.record.span;
    let mut lines = HashSet::new();
    for i_line in (span.start_line as u64 + 1)..=(span.end_line as u64 + 1) {
        if let Some(origin) = origin_map.resolve(i_line) {
            lines.insert((origin.file.clone(), origin.line));
        }
    }
    Some(lines)
}

fn score_candidate(dwarf_fn: &DwarfFunction, candidate: &TsCandidate<'_>) -> Option<CandidateScore> {
    let source_lines = candidate_source_lines(candidate)?;

    let overlap_count: u64 = dwarf_fn
        .line_row_multiset
        .iter()
        .filter(|row| source_lines.contains(&(row.file.clone(), row.line)))
        .map(|row| row.count)
        .sum();

    let overlap_ratio = if dwarf_fn.n_line_rows > 0 {
        overlap_count as f64 / dwarf_fn.n_line_rows as f64
    } else {
        0.0
    };

    Some(CandidateScore {
        ts_func_id: candidate.record.ts_func_id.clone(),
        tu_path: candidate.record.tu_path.clone(),
        overlap_count,
        overlap_ratio,
        context_hash: candidate.record.context_hash.to_string(),
    })
}

fn span_size(record: &TsFunctionRecord) -> usize {
    record.span.end_byte - record.span.start_byte
}

/// Aligns one DWARF function (already ACCEPT/WARN) against every candidate TS function.
pub fn align(
    dwarf_fn: &DwarfFunction,
    candidates: &[TsCandidate<'_>],
    thresholds: &JoinDwarfTsThresholds,
) -> AlignmentPair {
    let base = |candidates: Vec<CandidateScore>,
                best: Option<CandidateScore>,
                verdict: AlignmentVerdict,
                reasons: Vec<AlignmentReason>| {
        let gap_count = best
            .as_ref()
            .map(|b| dwarf_fn.n_line_rows.saturating_sub(b.overlap_count))
            .unwrap_or(dwarf_fn.n_line_rows);
        AlignmentPair {
            dwarf_function_id: dwarf_fn.id.clone(),
            dwarf_function_name: dwarf_fn.name.clone(),
            dwarf_decl: dwarf_fn.decl.clone(),
            dwarf_verdict: dwarf_fn.verdict,
            total_count: dwarf_fn.n_line_rows,
            gap_count,
            candidates,
            best,
            verdict,
            reasons,
        }
    };

    if candidates.is_empty() {
        return base(
            Vec::new(),
            None,
            AlignmentVerdict::NoMatch,
            vec![AlignmentReason::NoCandidates],
        );
    }

    let scored: Vec<(CandidateScore, &TsCandidate<'_>)> = candidates
        .iter()
        .filter_map(|c| score_candidate(dwarf_fn, c).map(|score| (score, c)))
        .collect();

    if scored.is_empty() {
        return base(
            Vec::new(),
            None,
            AlignmentVerdict::NoMatch,
            vec![AlignmentReason::OriginMapMissing],
        );
    }

    let mut ranked = scored;
    ranked.sort_by(|(a, ca), (b, cb)| {
        b.overlap_ratio
            .partial_cmp(&a.overlap_ratio)
            .unwrap()
            .then(b.overlap_count.cmp(&a.overlap_count))
            .then(span_size(ca.record).cmp(&span_size(cb.record)))
            .then(a.tu_path.cmp(&b.tu_path))
            .then(ca.record.span.start_byte.cmp(&cb.record.span.start_byte))
    });

    let all_scores: Vec<CandidateScore> = ranked.iter().map(|(s, _)| s.clone()).collect();

    let mut reasons = Vec::new();
    if dwarf_fn.warn_reasons.contains(&DwarfWarnReason::MultiFileRange) {
        reasons.push(AlignmentReason::MultiFileRangePropagated);
    }

    let (best_score, _) = &ranked[0];

    if best_score.overlap_count == 0 {
        reasons.push(AlignmentReason::NoOverlap);
        return base(
            all_scores,
            Some(best_score.clone()),
            AlignmentVerdict::NoMatch,
            reasons,
        );
    }

    if best_score.overlap_ratio < thresholds.min_overlap_ratio {
        reasons.push(AlignmentReason::LowOverlapRatio);
        return base(
            all_scores,
            Some(best_score.clone()),
            AlignmentVerdict::NoMatch,
            reasons,
        );
    }

    if best_score.overlap_count < thresholds.min_overlap_count {
        reasons.push(AlignmentReason::BelowMinOverlap);
        return base(
            all_scores,
            Some(best_score.clone()),
            AlignmentVerdict::NoMatch,
            reasons,
        );
    }

    if let Some((runner_up, _)) = ranked.get(1) {
        let near_tie = (best_score.overlap_ratio - runner_up.overlap_ratio).abs()
            <= thresholds.near_tie_epsilon;
        if near_tie {
            if best_score.context_hash == runner_up.context_hash
                && best_score.tu_path != runner_up.tu_path
            {
                reasons.push(AlignmentReason::HeaderReplicationCollision);
            } else {
                reasons.push(AlignmentReason::NearTie);
            }
            return base(
                all_scores,
                Some(best_score.clone()),
                AlignmentVerdict::Ambiguous,
                reasons,
            );
        }
    }

    reasons.push(AlignmentReason::UniqueBest);
    base(
        all_scores,
        Some(best_score.clone()),
        AlignmentVerdict::Match,
        reasons,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reforge_common::ExcludedPrefixes;
    use reforge_dwarf_oracle::{DeclTuple, LineRowCount, Segment};
    use reforge_ts_oracle::{SpanRecord, TsFunctionRecord};

    fn dwarf_function(rows: &[(&str, u64, u64)]) -> DwarfFunction {
        let line_row_multiset = rows
            .iter()
            .map(|(file, line, count)| LineRowCount {
                file: file.to_string(),
                line: *line,
                count: *count,
            })
            .collect::<Vec<_>>();
        let n_line_rows = line_row_multiset.iter().map(|r| r.count).sum();
        DwarfFunction {
            id: "0x0:0x10".to_string(),
            name: Some("target".to_string()),
            ranges: vec![Segment { begin: 0, end: 16 }],
            total_range_bytes: 16,
            line_row_multiset,
            n_line_rows,
            dominant_file: Some("main.c".to_string()),
            dominant_file_ratio: 1.0,
            decl: DeclTuple {
                file: Some("main.c".to_string()),
                line: Some(1),
                column: Some(1),
                comp_dir: Some("/src".to_string()),
                missing_reason: None,
            },
            verdict: reforge_common::Verdict::Accept,
            reject_reasons: Vec::new(),
            warn_reasons: Vec::new(),
        }
    }

    fn ts_function(tu_path: &str, start_line: usize, end_line: usize) -> TsFunctionRecord {
        TsFunctionRecord {
            ts_func_id: format!("{tu_path}:0:100:hash"),
            tu_path: tu_path.to_string(),
            name: Some("target".to_string()),
            span: SpanRecord {
                start_byte: 0,
                end_byte: 100,
                start_line,
                end_line,
            },
            signature_span: Some(SpanRecord {
                start_byte: 0,
                end_byte: 10,
                start_line,
                end_line: start_line,
            }),
            body_span: Some(SpanRecord {
                start_byte: 10,
                end_byte: 100,
                start_line,
                end_line,
            }),
            raw_text_hash: reforge_common::Sha256Hex::of_bytes(b"body"),
            context_hash: reforge_common::Sha256Hex::of_bytes(b"ctx"),
            structural_nodes: Vec::new(),
            recipes: Vec::new(),
            verdict: reforge_common::Verdict::Accept,
            reject_reasons: Vec::new(),
            warn_reasons: Vec::new(),
        }
    }

    #[test]
    fn unique_best_candidate_is_matched() {
        let dwarf_fn = dwarf_function(&[("main.c", 2, 5), ("main.c", 3, 5)]);
        let text = "#line 1 \"main.c\"\nint a;\nint b;\nint c;\n";
        let map = OriginMap::build(text, &ExcludedPrefixes::default());
        let record = ts_function("main.i", 1, 2);
        let candidates = vec![TsCandidate {
            record: &record,
            origin_map: Some(&map),
        }];
        let pair = align(&dwarf_fn, &candidates, &JoinDwarfTsThresholds::default());
        assert_eq!(pair.verdict, AlignmentVerdict::Match);
        assert!(pair.reasons.contains(&AlignmentReason::UniqueBest));
    }

    #[test]
    fn no_candidates_is_no_match() {
        let dwarf_fn = dwarf_function(&[("main.c", 2, 5)]);
        let pair = align(&dwarf_fn, &[], &JoinDwarfTsThresholds::default());
        assert_eq!(pair.verdict, AlignmentVerdict::NoMatch);
        assert_eq!(pair.reasons, vec![AlignmentReason::NoCandidates]);
    }

    #[test]
    fn below_overlap_ratio_is_no_match() {
        let dwarf_fn = dwarf_function(&[("main.c", 2, 5), ("other.c", 9, 50)]);
        let text = "#line 1 \"main.c\"\nint a;\nint b;\n";
        let map = OriginMap::build(text, &ExcludedPrefixes::default());
        let record = ts_function("main.i", 1, 1);
        let candidates = vec![TsCandidate {
            record: &record,
            origin_map: Some(&map),
        }];
        let pair = align(&dwarf_fn, &candidates, &JoinDwarfTsThresholds::default());
        assert_eq!(pair.verdict, AlignmentVerdict::NoMatch);
        assert!(pair.reasons.contains(&AlignmentReason::LowOverlapRatio));
    }
}
