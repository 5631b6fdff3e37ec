//! Per-function extraction: walks a compilation unit's DIE tree, normalizes each subprogram's
//! ranges, intersects them with the line program, and resolves the declaration tuple.

use std::collections::BTreeMap;

use gimli::read::Range;
use gimli::constants;
use thiserror::Error;

use crate::line_program::LineProgram;
use crate::ranges;
use crate::sections::{Dwarf, Slice};

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("gimli read error")]
    Gimli(#[from] gimli::Error),
    #[error(transparent)]
    Range(#[from] ranges::RangeError),
}

#[derive(Clone, Debug)]
pub struct DeclInfo {
    pub file: Option<String>,
    pub line: Option<u64>,
    pub column: Option<u64>,
    pub comp_dir: Option<String>,
    pub missing_reason: Option<&'static str>,
}

/// The raw facts extracted for one subprogram DIE, before a verdict is assigned.
#[derive(Clone, Debug)]
pub struct RawFunction {
    /// `cu_offset:die_offset` in `.debug_info`, hex-formatted. Stable within this one binary; not
    /// stable across optimization levels or rebuilds — see the decl tuple for that identity.
    pub id: String,
    pub name: Option<String>,
    pub ranges: Vec<Range>,
    pub total_range_bytes: u64,
    /// `(file, line) -> count`, ordered for determinism.
    pub line_row_multiset: BTreeMap<(String, u64), u64>,
    pub n_line_rows: u64,
    pub dominant_file: Option<String>,
    pub dominant_file_ratio: f64,
    pub decl: DeclInfo,
}

/// Extracts every `DW_TAG_subprogram` in `unit`, using `line_program` (already prepared once per
/// unit) for line intersection.
pub fn walk_unit(
    dwarf: &Dwarf<'_>,
    unit: &gimli::Unit<Slice<'_>>,
    line_program: Option<&LineProgram<'_>>,
    is_relocatable: bool,
    cu_offset: usize,
) -> Result<Vec<RawFunction>, FunctionError> {
    let mut out = Vec::new();
    let mut cursor = unit.entries();

    while let Some((_, entry)) = cursor.next_dfs()? {
        if entry.tag() != constants::DW_TAG_subprogram {
            continue;
        }

        let die_offset = entry.offset().0;
        let id = format!("{cu_offset:#x}:{die_offset:#x}");

        let mut low_pc = None;
        let mut high_pc = None;
        let mut high_pc_is_offset = false;
        let mut range_list_offset = None;
        let mut name = None;
        let mut decl_file_index = None;
        let mut decl_line = None;
        let mut decl_column = None;

        let mut attrs = entry.attrs();
        while let Some(attr) = attrs.next()? {
            match attr.name() {
                constants::DW_AT_low_pc => {
                    if let gimli::AttributeValue::Addr(addr) = attr.value() {
                        low_pc = Some(addr);
                    }
                }
                constants::DW_AT_high_pc => match attr.value() {
                    gimli::AttributeValue::Addr(addr) => {
                        high_pc = Some(addr);
                        high_pc_is_offset = false;
                    }
                    gimli::AttributeValue::Udata(offset) => {
                        high_pc = Some(offset);
                        high_pc_is_offset = true;
                    }
                    _ => {}
                },
                constants::DW_AT_ranges => {
                    range_list_offset = dwarf.attr_ranges_offset(unit, attr.value())?;
                }
                constants::DW_AT_name => {
                    name = dwarf
                        .attr_string(unit, attr.value())
                        .ok()
                        .map(|r| String::from_utf8_lossy(&r.slice()).into_owned());
                }
                constants::DW_AT_decl_file => {
                    if let gimli::AttributeValue::FileIndex(idx) = attr.value() {
                        decl_file_index = Some(idx);
                    }
                }
                constants::DW_AT_decl_line => {
                    if let gimli::AttributeValue::Udata(line) = attr.value() {
                        decl_line = Some(line);
                    }
                }
                constants::DW_AT_decl_column => {
                    if let gimli::AttributeValue::Udata(col) = attr.value() {
                        decl_column = Some(col);
                    }
                }
                _ => {}
            }
        }

        let mut raw_ranges = Vec::new();
        if let Some(offset) = range_list_offset {
            let mut range_iter = dwarf.ranges(unit, offset)?;
            while let Some(range) = range_iter.next()? {
                if range.begin > 0 || is_relocatable {
                    raw_ranges.push(range);
                }
            }
        } else if let Some(range) = ranges::convert_pc_range(
            low_pc,
            high_pc,
            high_pc_is_offset,
            is_relocatable,
        )? {
            raw_ranges.push(range);
        }

        let normalized = ranges::normalize(raw_ranges);
        let total_range_bytes = ranges::total_bytes(&normalized);

        let mut line_row_multiset: BTreeMap<(String, u64), u64> = BTreeMap::new();
        if let Some(program) = line_program {
            for range in &normalized {
                for row in program.rows_in_range(range) {
                    let Some(line) = row.line else { continue };
                    let path =
                        resolve_file_name(dwarf, unit, program.header(), row.file_index);
                    *line_row_multiset.entry((path, line)).or_insert(0) += 1;
                }
            }
        }

        let n_line_rows: u64 = line_row_multiset.values().sum();
        let mut per_file: BTreeMap<&str, u64> = BTreeMap::new();
        for ((file, _), count) in &line_row_multiset {
            *per_file.entry(file.as_str()).or_insert(0) += count;
        }
        let (dominant_file, dominant_count) = per_file
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(file, count)| (Some((*file).to_string()), *count))
            .unwrap_or((None, 0));
        let dominant_file_ratio = if n_line_rows > 0 {
            dominant_count as f64 / n_line_rows as f64
        } else {
            0.0
        };

        let decl_file = decl_file_index
            .map(|idx| resolve_decl_file(dwarf, unit, idx))
            .unwrap_or(None);
        let comp_dir = unit
            .comp_dir
            .as_ref()
            .map(|dir| String::from_utf8_lossy(&dir.slice()).into_owned());

        let missing_reason = if decl_file.is_none() {
            Some("decl_file index absent or unresolved")
        } else if decl_line.is_none() {
            Some("decl_line attribute absent")
        } else {
            None
        };

        out.push(RawFunction {
            id,
            name,
            ranges: normalized,
            total_range_bytes,
            line_row_multiset,
            n_line_rows,
            dominant_file,
            dominant_file_ratio,
            decl: DeclInfo {
                file: decl_file,
                line: decl_line,
                column: decl_column,
                comp_dir,
                missing_reason,
            },
        });
    }

    Ok(out)
}

fn resolve_file_name(
    dwarf: &Dwarf<'_>,
    unit: &gimli::Unit<Slice<'_>>,
    header: &gimli::LineProgramHeader<Slice<'_>>,
    file_index: u64,
) -> String {
    let Some(file) = header.file(file_index) else {
        return "<unknown>".to_string();
    };
    let dir = file
        .directory(header)
        .and_then(|attr| dwarf.attr_string(unit, attr).ok())
        .map(|r| String::from_utf8_lossy(&r.slice()).into_owned())
        .filter(|s| !s.is_empty());
    let name = dwarf
        .attr_string(unit, file.path_name())
        .ok()
        .map(|r| String::from_utf8_lossy(&r.slice()).into_owned())
        .unwrap_or_default();

    match dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name,
    }
}

fn resolve_decl_file(dwarf: &Dwarf<'_>, unit: &gimli::Unit<Slice<'_>>, idx: u64) -> Option<String> {
    let program = unit.line_program.as_ref()?;
    let header = program.header();
    Some(resolve_file_name(dwarf, unit, header, idx))
}
