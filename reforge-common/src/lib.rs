//! Shared types, configuration, hashing, and I/O helpers for the reforge extraction and join
//! pipeline.
//!
//! This crate carries no stage-specific logic; it exists so the builder, the two oracles, the
//! decompiler-output reshape, and the two joiners agree on provenance keys, matrix coordinates,
//! and on-disk write semantics without depending on each other.

mod byteview;
mod config;
mod elf_meta;
mod hash;
mod io;
mod matrix;
mod schema;
mod verdict;

pub use byteview::MappedFile;
pub use config::{
    DwarfThresholds, ExcludedPrefixes, JoinDecompileThresholds, JoinDwarfTsThresholds,
    ReforgeConfig, Timeouts, TsThresholds,
};
pub use elf_meta::{Arch, ElfMetadata, ElfMetaError, ObjectKind};
pub use hash::{RollingHasher, Sha256Hex};
pub use io::{write_json_atomic, write_jsonl_atomic, WriteError};
pub use matrix::{Cell, OptLevel, Variant};
pub use schema::{OutputHeader, PACKAGE_NAME, PACKAGE_VERSION, SCHEMA_VERSION};
pub use verdict::Verdict;
