//! Stable `storage_key` assignment for a reshaped variable.

use crate::raw::{RawStorageClass, RawVariable};

/// Builds the stable key used to identify a variable across re-runs: `stack:off:±0xN`,
/// `reg:NAME`, `mem:0xADDR`, or `uniq:NAME`.
pub fn storage_key(variable: &RawVariable) -> String {
    let detail = variable.storage_detail.as_deref().unwrap_or("");
    match variable.storage_class {
        RawStorageClass::Stack => {
            let offset: i64 = detail.parse().unwrap_or(0);
            let sign = if offset >= 0 { "+" } else { "-" };
            format!("stack:off:{sign}{:#x}", offset.unsigned_abs())
        }
        RawStorageClass::Register => format!("reg:{detail}"),
        RawStorageClass::Memory => {
            let addr: u64 = detail
                .trim_start_matches("0x")
                .parse_radix_or_decimal();
            format!("mem:{addr:#x}")
        }
        RawStorageClass::Unique | RawStorageClass::Unknown => {
            let name = variable.name.as_deref().unwrap_or(detail);
            format!("uniq:{name}")
        }
    }
}

trait ParseRadixOrDecimal {
    fn parse_radix_or_decimal(&self) -> u64;
}

impl ParseRadixOrDecimal for str {
    fn parse_radix_or_decimal(&self) -> u64 {
        u64::from_str_radix(self, 16).unwrap_or_else(|_| self.parse().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(class: RawStorageClass, detail: &str) -> RawVariable {
        RawVariable {
            name: Some("x".to_string()),
            storage_class: class,
            storage_detail: Some(detail.to_string()),
            type_string: None,
            access_sites: Vec::new(),
        }
    }

    #[test]
    fn stack_offset_is_signed_hex() {
        assert_eq!(storage_key(&var(RawStorageClass::Stack, "-16")), "stack:off:-0x10");
        assert_eq!(storage_key(&var(RawStorageClass::Stack, "16")), "stack:off:+0x10");
    }

    #[test]
    fn register_key_uses_the_register_name() {
        assert_eq!(storage_key(&var(RawStorageClass::Register, "rdi")), "reg:rdi");
    }

    #[test]
    fn memory_key_is_a_hex_address() {
        assert_eq!(storage_key(&var(RawStorageClass::Memory, "0x404040")), "mem:0x404040");
    }

    #[test]
    fn unique_key_falls_back_to_name() {
        let variable = var(RawStorageClass::Unique, "");
        assert_eq!(storage_key(&variable), "uniq:x");
    }
}
