//! A prepared line-number program: built once per compilation unit and reused across every
//! function in that unit, so line intersection is a binary search rather than a linear scan.

use gimli::read::Range;
use gimli::IncompleteLineProgram;

use crate::sections::Slice;

#[derive(Clone, Copy, Debug)]
pub struct LineRow {
    pub address: u64,
    pub file_index: u64,
    pub line: Option<u64>,
}

#[derive(Debug)]
struct Sequence {
    start: u64,
    end: u64,
    rows: Vec<LineRow>,
}

/// A compilation unit's line-number program, indexed into address-ordered sequences for
/// efficient range lookups.
#[derive(Debug)]
pub struct LineProgram<'d> {
    header: gimli::LineProgramHeader<Slice<'d>>,
    sequences: Vec<Sequence>,
}

impl<'d> LineProgram<'d> {
    pub fn prepare(program: IncompleteLineProgram<Slice<'d>>) -> Self {
        let mut sequences = Vec::new();
        let mut current: Vec<LineRow> = Vec::new();
        let mut prev_address = 0u64;
        let mut rows = program.rows();

        while let Ok(Some((_, row))) = rows.next_row() {
            let address = row.address();
            if address == 0 {
                continue;
            }

            if row.end_sequence() {
                if !current.is_empty() {
                    let start = current[0].address;
                    let end = if address < prev_address {
                        prev_address + 1
                    } else {
                        address
                    };
                    sequences.push(Sequence {
                        start,
                        end,
                        rows: current.drain(..).collect(),
                    });
                }
                prev_address = 0;
                continue;
            }

            if address < prev_address {
                continue;
            }

            let file_index = row.file_index();
            let line = row.line().map(|v| v.get());
            if let Some(last) = current.last_mut() {
                if last.address == address {
                    last.file_index = file_index;
                    last.line = line;
                    prev_address = address;
                    continue;
                }
            }
            current.push(LineRow {
                address,
                file_index,
                line,
            });
            prev_address = address;
        }

        if !current.is_empty() {
            let start = current[0].address;
            sequences.push(Sequence {
                start,
                end: prev_address + 1,
                rows: current,
            });
        }

        dmsort::sort_by_key(&mut sequences, |s| s.start);

        LineProgram {
            header: rows.header().clone(),
            sequences,
        }
    }

    pub fn header(&self) -> &gimli::LineProgramHeader<Slice<'d>> {
        &self.header
    }

    /// Every row whose address lies within `range`, across every overlapping sequence.
    pub fn rows_in_range(&self, range: &Range) -> Vec<LineRow> {
        let mut out = Vec::new();
        for seq in &self.sequences {
            if seq.end <= range.begin || seq.start > range.end {
                continue;
            }

            let from = match seq.rows.binary_search_by_key(&range.begin, |r| r.address) {
                Ok(idx) => idx,
                Err(0) => 0,
                Err(next) => next - 1,
            };

            for row in &seq.rows[from..] {
                if row.address >= range.begin && row.address < range.end {
                    out.push(*row);
                }
            }
        }
        out
    }
}
