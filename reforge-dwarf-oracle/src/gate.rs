//! The binary gate: fatal, binary-level checks that short-circuit function extraction.

use crate::report::BinaryRejectReason;
use crate::sections;

/// Returns `Some(reason)` if `data` fails any binary-level precondition, in priority order.
pub fn check(data: &[u8]) -> Option<BinaryRejectReason> {
    match sections::is_x86_64(data) {
        Ok(true) => {}
        Ok(false) => return Some(BinaryRejectReason::NotElfX8664),
        Err(_) => return Some(BinaryRejectReason::ParserCannotOpen),
    }

    match sections::has_section(data, ".debug_info") {
        Ok(true) => {}
        Ok(false) => return Some(BinaryRejectReason::MissingDebugInfo),
        Err(_) => return Some(BinaryRejectReason::ParserCannotOpen),
    }

    match sections::has_section(data, ".debug_line") {
        Ok(true) => {}
        Ok(false) => return Some(BinaryRejectReason::MissingDebugLine),
        Err(_) => return Some(BinaryRejectReason::ParserCannotOpen),
    }

    match sections::has_split_dwarf(data) {
        Ok(false) => {}
        Ok(true) => return Some(BinaryRejectReason::SplitDwarfDetected),
        Err(_) => return Some(BinaryRejectReason::ParserCannotOpen),
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_elf_data_is_rejected() {
        assert_eq!(check(b"not an elf"), Some(BinaryRejectReason::ParserCannotOpen));
    }
}
