//! Fixture-backed integration test for the DWARF oracle's binary gate, mirroring
//! `symbolic-debuginfo/tests/test_objects.rs`'s fixture-plus-snapshot shape.
//!
//! A real DWARF-bearing ELF fixture needs a C toolchain to produce, which this workspace doesn't
//! invoke as part of its own test suite. The fixture here is instead a minimal valid ELF64
//! header with no section table at all, built by hand rather than checked in as a binary file,
//! since it exercises the same `run` entry point and the same early-exit reject path
//! (`MissingDebugInfo`) that a real stripped-of-debug-info binary would.

use reforge_common::{DwarfThresholds, ExcludedPrefixes, Verdict};
use similar_asserts::assert_eq;

use reforge_dwarf_oracle::BinaryRejectReason;

/// Builds a 64-byte ELF64 header for a little-endian x86-64 object with zero program and
/// section headers: enough for `goblin::Elf::parse` to succeed and for every section lookup to
/// come back "not present".
fn minimal_x86_64_elf() -> Vec<u8> {
    let mut buf = vec![0u8; 64];
    buf[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
    buf[4] = 2; // ELFCLASS64
    buf[5] = 1; // ELFDATA2LSB
    buf[6] = 1; // EI_VERSION
    buf[16..18].copy_from_slice(&2u16.to_le_bytes()); // e_type = ET_EXEC
    buf[18..20].copy_from_slice(&62u16.to_le_bytes()); // e_machine = EM_X86_64
    buf[20..24].copy_from_slice(&1u32.to_le_bytes()); // e_version
    buf[52..54].copy_from_slice(&64u16.to_le_bytes()); // e_ehsize
    buf[54..56].copy_from_slice(&56u16.to_le_bytes()); // e_phentsize
    buf[58..60].copy_from_slice(&64u16.to_le_bytes()); // e_shentsize
    buf
}

#[test]
fn header_only_elf_is_rejected_for_missing_debug_info() {
    let data = minimal_x86_64_elf();
    let thresholds = DwarfThresholds::default();
    let prefixes = ExcludedPrefixes::default();

    let report = reforge_dwarf_oracle::run(&data, "default", &thresholds, &prefixes).unwrap();

    assert_eq!(report.verdict, Verdict::Reject);
    assert_eq!(
        report.reject_reason,
        Some(BinaryRejectReason::MissingDebugInfo)
    );
    assert!(report.functions.is_empty());
}

/// The gate and report construction are pure functions of the input bytes: re-running over the
/// same fixture must produce byte-identical JSON.
#[test]
fn gate_rejection_is_deterministic_across_runs() {
    let data = minimal_x86_64_elf();
    let thresholds = DwarfThresholds::default();
    let prefixes = ExcludedPrefixes::default();

    let first = reforge_dwarf_oracle::run(&data, "default", &thresholds, &prefixes).unwrap();
    let second = reforge_dwarf_oracle::run(&data, "default", &thresholds, &prefixes).unwrap();

    let first_json = serde_json::to_string_pretty(&first).unwrap();
    let second_json = serde_json::to_string_pretty(&second).unwrap();
    assert_eq!(first_json, second_json);
}
