//! Loads the raw DWARF sections out of an ELF file and hands them to `gimli`.

use gimli::{EndianSlice, RunTimeEndian};
use goblin::elf::Elf;
use thiserror::Error;

pub type Slice<'d> = EndianSlice<'d, RunTimeEndian>;
pub type Dwarf<'d> = gimli::Dwarf<Slice<'d>>;

#[derive(Debug, Error)]
pub enum SectionError {
    #[error("file is not a valid ELF object")]
    Malformed(#[source] goblin::error::Error),
    #[error("failed to load a DWARF section")]
    Gimli(#[source] gimli::Error),
}

/// True iff the ELF has an x86-64 machine type, per the binary gate's first check.
pub fn is_x86_64(data: &[u8]) -> Result<bool, SectionError> {
    let elf = Elf::parse(data).map_err(SectionError::Malformed)?;
    Ok(elf.header.e_machine == goblin::elf::header::EM_X86_64)
}

fn section_data<'d>(elf: &Elf<'_>, data: &'d [u8], name: &str) -> Option<&'d [u8]> {
    elf.section_headers.iter().find_map(|sh| {
        let found = elf.shdr_strtab.get_at(sh.sh_name)?;
        if found != name {
            return None;
        }
        let start = sh.sh_offset as usize;
        let end = start.checked_add(sh.sh_size as usize)?;
        data.get(start..end)
    })
}

/// True iff any compilation unit references a split-DWARF (.dwo) companion file.
pub fn has_split_dwarf(data: &[u8]) -> Result<bool, SectionError> {
    let elf = Elf::parse(data).map_err(SectionError::Malformed)?;
    Ok(section_data(&elf, data, ".debug_info.dwo").is_some()
        || section_data(&elf, data, ".debug_cu_index").is_some())
}

pub fn has_section(data: &[u8], name: &str) -> Result<bool, SectionError> {
    let elf = Elf::parse(data).map_err(SectionError::Malformed)?;
    Ok(section_data(&elf, data, name).is_some())
}

/// Loads every section `gimli` needs, returning sections of length zero when absent.
pub fn load<'d>(data: &'d [u8]) -> Result<Dwarf<'d>, SectionError> {
    let elf = Elf::parse(data).map_err(SectionError::Malformed)?;
    let endian = if elf.little_endian {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let load_section = |name: &str| -> Result<Slice<'d>, gimli::Error> {
        Ok(EndianSlice::new(
            section_data(&elf, data, name).unwrap_or(&[]),
            endian,
        ))
    };

    gimli::Dwarf::load(|section_id| load_section(section_id.name())).map_err(SectionError::Gimli)
}
