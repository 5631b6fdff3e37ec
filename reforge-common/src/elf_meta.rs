//! Minimal ELF header/section introspection shared by the builder (post-condition checks) and
//! the DWARF oracle (the binary gate).
//!
//! This intentionally does not attempt to be a general-purpose object file abstraction the way
//! `symbolic-debuginfo::elf::ElfObject` is; it only extracts the handful of facts this pipeline's
//! `ArtifactDescriptor` and binary gate need.

use goblin::elf::Elf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing an ELF header.
#[derive(Debug, Error)]
pub enum ElfMetaError {
    #[error("file is not a valid ELF object")]
    Malformed(#[source] goblin::error::Error),
}

/// Machine architecture, narrowed to the one value this pipeline supports plus a catch-all.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    X86_64,
    Other,
}

/// The ELF `e_type` classification relevant to this pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Relocatable,
    Executable,
    SharedObject,
    Other,
}

/// ELF facts recorded on an `ArtifactDescriptor` and consulted by the DWARF oracle's binary gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElfMetadata {
    pub kind: ObjectKind,
    pub arch: Arch,
    /// Hex-encoded `NT_GNU_BUILD_ID` note, if the linker emitted one.
    pub build_id: Option<String>,
    pub has_debug_info: bool,
    pub has_debug_line: bool,
    pub is_little_endian: bool,
}

impl ElfMetadata {
    /// Parses ELF header and section information out of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, ElfMetaError> {
        let elf = Elf::parse(data).map_err(ElfMetaError::Malformed)?;

        let kind = match elf.header.e_type {
            goblin::elf::header::ET_REL => ObjectKind::Relocatable,
            goblin::elf::header::ET_EXEC => ObjectKind::Executable,
            goblin::elf::header::ET_DYN => ObjectKind::SharedObject,
            _ => ObjectKind::Other,
        };

        let arch = match elf.header.e_machine {
            goblin::elf::header::EM_X86_64 => Arch::X86_64,
            _ => Arch::Other,
        };

        let build_id = find_build_id(&elf, data).map(hex_encode);
        let has_debug_info = find_section(&elf, ".debug_info").is_some();
        let has_debug_line = find_section(&elf, ".debug_line").is_some();

        Ok(ElfMetadata {
            kind,
            arch,
            build_id,
            has_debug_info,
            has_debug_line,
            is_little_endian: elf.little_endian,
        })
    }

    /// True iff every `.debug_*` section has been removed.
    pub fn is_fully_stripped(data: &[u8]) -> Result<bool, ElfMetaError> {
        let elf = Elf::parse(data).map_err(ElfMetaError::Malformed)?;
        Ok(!elf
            .section_headers
            .iter()
            .filter_map(|sh| elf.shdr_strtab.get_at(sh.sh_name))
            .any(|name| name.starts_with(".debug_")))
    }
}

fn find_section<'d>(elf: &Elf<'d>, name: &str) -> Option<usize> {
    elf.section_headers.iter().position(|sh| {
        elf.shdr_strtab
            .get_at(sh.sh_name)
            .is_some_and(|found| found == name)
    })
}

fn find_build_id<'d>(elf: &Elf<'d>, data: &'d [u8]) -> Option<&'d [u8]> {
    if let Some(mut notes) = elf.iter_note_headers(data) {
        while let Some(Ok(note)) = notes.next() {
            if note.n_type == goblin::elf::note::NT_GNU_BUILD_ID {
                return Some(note.desc);
            }
        }
    }

    if let Some(mut notes) = elf.iter_note_sections(data, Some(".note.gnu.build-id")) {
        while let Some(Ok(note)) = notes.next() {
            if note.n_type == goblin::elf::note::NT_GNU_BUILD_ID {
                return Some(note.desc);
            }
        }
    }

    None
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
