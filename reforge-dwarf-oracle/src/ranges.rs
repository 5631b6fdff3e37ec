//! Range materialization and normalization for a single subprogram DIE.

use gimli::read::Range;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("function range is inverted (low_pc > high_pc)")]
    Inverted,
}

/// Converts `DW_AT_low_pc`/`DW_AT_high_pc` into a single range, applying the same sentinel
/// handling DWARF producers rely on: a zero `low_pc` in a non-relocatable object means
/// linker-eliminated code, and `u64::MAX`/`u64::MAX - 1` mark deleted code.
pub fn convert_pc_range(
    low_pc: Option<u64>,
    high_pc: Option<u64>,
    high_pc_is_offset: bool,
    is_relocatable: bool,
) -> Result<Option<Range>, RangeError> {
    let low_pc = match low_pc {
        Some(low_pc) if low_pc != 0 || is_relocatable => low_pc,
        _ => return Ok(None),
    };

    let high_pc = match high_pc {
        Some(value) if high_pc_is_offset => low_pc.wrapping_add(value),
        Some(value) => value,
        None => return Ok(None),
    };

    if low_pc == high_pc {
        return Ok(None);
    }
    if low_pc == u64::MAX || low_pc == u64::MAX - 1 {
        return Ok(None);
    }
    if low_pc > high_pc {
        return Err(RangeError::Inverted);
    }

    Ok(Some(Range {
        begin: low_pc,
        end: high_pc,
    }))
}

/// Drops empty ranges, sorts by start address, and merges overlapping or adjacent segments.
pub fn normalize(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.retain(|r| r.begin < r.end);
    ranges.sort_by_key(|r| r.begin);

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.begin <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

pub fn total_bytes(ranges: &[Range]) -> u64 {
    ranges.iter().map(|r| r.end - r.begin).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_low_pc_is_dropped_for_non_relocatable() {
        let result = convert_pc_range(Some(0), Some(100), false, false).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn zero_low_pc_is_kept_for_relocatable() {
        let result = convert_pc_range(Some(0), Some(100), false, true).unwrap();
        assert_eq!(result, Some(Range { begin: 0, end: 100 }));
    }

    #[test]
    fn max_sentinel_is_dropped() {
        let result = convert_pc_range(Some(u64::MAX), Some(10), true, false).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn inverted_range_is_an_error() {
        let result = convert_pc_range(Some(200), Some(100), false, false);
        assert!(matches!(result, Err(RangeError::Inverted)));
    }

    #[test]
    fn high_pc_offset_is_added_to_low_pc() {
        let result = convert_pc_range(Some(100), Some(50), true, false).unwrap();
        assert_eq!(result, Some(Range { begin: 100, end: 150 }));
    }

    #[test]
    fn overlapping_and_adjacent_ranges_are_merged() {
        let ranges = vec![
            Range { begin: 0, end: 10 },
            Range { begin: 10, end: 20 },
            Range { begin: 25, end: 30 },
        ];
        let merged = normalize(ranges);
        assert_eq!(
            merged,
            vec![Range { begin: 0, end: 20 }, Range { begin: 25, end: 30 }]
        );
        assert_eq!(total_bytes(&merged), 25);
    }
}
