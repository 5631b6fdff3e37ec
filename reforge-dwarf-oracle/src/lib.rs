//! Extracts per-function ranges, line-row multisets, and declaration tuples from a binary's
//! DWARF debug information, and assigns each function (and the binary as a whole) a quality
//! verdict.
//!
//! REJECT at the binary level short-circuits function extraction entirely: a binary that fails
//! the gate produces a report with an empty function array.

mod function;
mod gate;
mod line_program;
mod ranges;
mod report;
mod sections;

use reforge_common::{DwarfThresholds, ExcludedPrefixes, OutputHeader, Sha256Hex, Verdict};
use thiserror::Error;

pub use function::{DeclInfo, FunctionError, RawFunction};
pub use report::{
    BinaryRejectReason, DeclTuple, DwarfFunction, DwarfReport, FunctionRejectReason,
    FunctionWarnReason, LineRowCount, Segment,
};
pub use sections::SectionError;

#[derive(Debug, Error)]
pub enum DwarfOracleError {
    #[error(transparent)]
    Section(#[from] SectionError),
    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Runs the DWARF oracle over one binary's bytes, producing its report.
pub fn run(
    data: &[u8],
    profile_id: &str,
    dwarf_thresholds: &DwarfThresholds,
    excluded_prefixes: &ExcludedPrefixes,
) -> Result<DwarfReport, DwarfOracleError> {
    let binary_sha256 = Sha256Hex::of_bytes(data);
    let header = OutputHeader::new(profile_id, binary_sha256);

    if let Some(reject_reason) = gate::check(data) {
        tracing::warn!(?reject_reason, "binary gate rejected input");
        return Ok(DwarfReport {
            header,
            verdict: Verdict::Reject,
            reject_reason: Some(reject_reason),
            functions: Vec::new(),
        });
    }

    let dwarf = sections::load(data)?;
    let is_relocatable = {
        let elf = goblin::elf::Elf::parse(data).map_err(SectionError::Malformed)?;
        elf.header.e_type == goblin::elf::header::ET_REL
    };

    let mut raw_functions = Vec::new();
    let mut units = dwarf.units();
    while let Some(header) = units.next().map_err(SectionError::Gimli)? {
        let cu_offset = match header.offset() {
            gimli::UnitSectionOffset::DebugInfoOffset(o) => o.0,
            gimli::UnitSectionOffset::DebugTypesOffset(o) => o.0,
        };
        let unit = dwarf.unit(header).map_err(SectionError::Gimli)?;
        let line_program = unit
            .line_program
            .clone()
            .map(line_program::LineProgram::prepare);

        raw_functions.extend(function::walk_unit(
            &dwarf,
            &unit,
            line_program.as_ref(),
            is_relocatable,
            cu_offset,
        )?);
    }

    let functions: Vec<DwarfFunction> = raw_functions
        .into_iter()
        .map(|raw| classify(raw, dwarf_thresholds, excluded_prefixes))
        .collect();

    Ok(DwarfReport {
        header,
        verdict: Verdict::Accept,
        reject_reason: None,
        functions,
    })
}

fn classify(
    raw: RawFunction,
    thresholds: &DwarfThresholds,
    excluded_prefixes: &ExcludedPrefixes,
) -> DwarfFunction {
    let mut reject_reasons = Vec::new();
    let mut warn_reasons = Vec::new();

    if raw.ranges.is_empty() {
        if raw.decl.file.is_some() {
            reject_reasons.push(FunctionRejectReason::DeclarationOnly);
        } else {
            reject_reasons.push(FunctionRejectReason::MissingRange);
        }
    } else if raw.n_line_rows == 0 {
        reject_reasons.push(FunctionRejectReason::NoLineRowsInRange);
    }

    if reject_reasons.is_empty() {
        if raw.dominant_file_ratio < thresholds.multi_file_ratio {
            warn_reasons.push(FunctionWarnReason::MultiFileRange);
        }
        if raw
            .dominant_file
            .as_deref()
            .is_some_and(|f| excluded_prefixes.matches(f))
        {
            warn_reasons.push(FunctionWarnReason::SystemHeaderDominant);
        }
        if raw.ranges.len() >= thresholds.fragmented_segment_count {
            warn_reasons.push(FunctionWarnReason::RangesFragmented);
        }
        if raw.name.is_none() {
            warn_reasons.push(FunctionWarnReason::NameMissing);
        }
    }

    let verdict = if !reject_reasons.is_empty() {
        Verdict::Reject
    } else if !warn_reasons.is_empty() {
        Verdict::Warn
    } else {
        Verdict::Accept
    };

    let mut line_row_multiset: Vec<LineRowCount> = raw
        .line_row_multiset
        .into_iter()
        .map(|((file, line), count)| LineRowCount { file, line, count })
        .collect();
    line_row_multiset.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));

    DwarfFunction {
        id: raw.id,
        name: raw.name,
        ranges: raw
            .ranges
            .into_iter()
            .map(|r| Segment {
                begin: r.begin,
                end: r.end,
            })
            .collect(),
        total_range_bytes: raw.total_range_bytes,
        line_row_multiset,
        n_line_rows: raw.n_line_rows,
        dominant_file: raw.dominant_file,
        dominant_file_ratio: raw.dominant_file_ratio,
        decl: DeclTuple {
            file: raw.decl.file,
            line: raw.decl.line,
            column: raw.decl.column,
            comp_dir: raw.decl.comp_dir,
            missing_reason: raw.decl.missing_reason.map(str::to_string),
        },
        verdict,
        reject_reasons,
        warn_reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_elf_input_is_rejected_at_the_gate() {
        let thresholds = DwarfThresholds::default();
        let prefixes = ExcludedPrefixes::default();
        let report = run(b"not an elf file", "default", &thresholds, &prefixes).unwrap();
        assert_eq!(report.verdict, Verdict::Reject);
        assert_eq!(report.reject_reason, Some(BinaryRejectReason::ParserCannotOpen));
        assert!(report.functions.is_empty());
    }
}
