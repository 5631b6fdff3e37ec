//! `BuildReceipt`: the single authoritative output of a builder job.

use std::collections::BTreeMap;

use reforge_common::{Cell, ElfMetadata, Sha256Hex, Variant};
use serde::{Deserialize, Serialize};

use crate::profile::BuildProfile;

/// A non-exhaustive cell-level flag. New variants can be added without breaking readers that
/// match on a catch-all arm, mirroring the receipt's own forward-compatibility stance.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellFlag {
    BuildFailed,
    Timeout,
    CompileUnitFailed,
    LinkFailed,
    StripFailed,
    NoArtifact,
    NonElfOutput,
    DebugExpectedMissing,
    StripExpectedMissing,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    Success,
    Failed,
}

/// The outcome of one subprocess invocation: compile a TU, link a cell, or strip a binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub command: Vec<String>,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

impl PhaseRecord {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// One compiled translation unit within a cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompileUnitRecord {
    pub source_relative_path: String,
    pub object_sha256: Option<Sha256Hex>,
    pub phase: PhaseRecord,
}

/// The produced binary for a cell: path, hash, size, and its real ELF metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub relative_path: String,
    pub sha256: Sha256Hex,
    pub size_bytes: u64,
    pub elf_metadata: Option<ElfMetadata>,
}

/// One translation unit's optimization-independent preprocessing result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessUnit {
    pub source_relative_path: String,
    pub output_relative_path: String,
    pub output_sha256: Option<Sha256Hex>,
    pub phase: PhaseRecord,
}

impl PreprocessUnit {
    pub fn succeeded(&self) -> bool {
        self.phase.succeeded()
    }
}

/// All records for one `(optimization, variant)` point in the build matrix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildCell {
    pub cell: Cell,
    pub status: CellStatus,
    pub compile_units: Vec<CompileUnitRecord>,
    pub link: Option<PhaseRecord>,
    pub strip: Option<PhaseRecord>,
    pub flags: Vec<CellFlag>,
    pub artifact: Option<ArtifactDescriptor>,
}

impl BuildCell {
    pub fn has_flag(&self, flag: CellFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// The resolved compiler/strip-tool identity recorded once per job, not per cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolchainIdentity {
    pub compiler_path: String,
    pub compiler_version: String,
    pub strip_tool_path: String,
    pub strip_tool_version: String,
    pub os: String,
    pub arch: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Success,
    PartialFailure,
    Failed,
}

/// The single, immutable output of one builder job: `build_receipt.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildReceipt {
    pub builder_name: String,
    pub builder_version: String,
    pub snapshot_archive_sha256: Sha256Hex,
    pub toolchain: ToolchainIdentity,
    pub profile: BuildProfile,
    pub preprocess: Vec<PreprocessUnit>,
    pub cells: Vec<BuildCell>,
    pub job_status: JobStatus,
}

impl BuildReceipt {
    /// Every successfully-built artifact's `binary_sha256`, keyed by cell for stable lookup.
    pub fn artifacts_by_cell(&self) -> BTreeMap<Cell, &ArtifactDescriptor> {
        self.cells
            .iter()
            .filter_map(|c| c.artifact.as_ref().map(|a| (c.cell, a)))
            .collect()
    }

    /// Derives the overall job status from the cell outcomes: all succeeded, some succeeded, or
    /// none succeeded.
    pub fn derive_job_status(cells: &[BuildCell]) -> JobStatus {
        let succeeded = cells.iter().filter(|c| c.status == CellStatus::Success).count();
        if succeeded == cells.len() {
            JobStatus::Success
        } else if succeeded == 0 {
            JobStatus::Failed
        } else {
            JobStatus::PartialFailure
        }
    }

    /// Whether the `stripped` cell for every opt level is actually free of `.debug_*` sections,
    /// per the variant's required post-condition.
    pub fn stripped_cells_clean(&self) -> bool {
        self.cells
            .iter()
            .filter(|c| c.cell.variant == Variant::Stripped)
            .all(|c| !c.has_flag(CellFlag::StripExpectedMissing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reforge_common::OptLevel;

    fn phase(exit_code: i32) -> PhaseRecord {
        PhaseRecord {
            command: vec!["cc".to_string()],
            exit_code: Some(exit_code),
            timed_out: false,
            duration_ms: 1,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn cell(status: CellStatus) -> BuildCell {
        BuildCell {
            cell: Cell::new(OptLevel::O0, Variant::Debug),
            status,
            compile_units: Vec::new(),
            link: Some(phase(0)),
            strip: None,
            flags: Vec::new(),
            artifact: None,
        }
    }

    #[test]
    fn job_status_is_success_when_all_cells_succeed() {
        let cells = vec![cell(CellStatus::Success), cell(CellStatus::Success)];
        assert_eq!(BuildReceipt::derive_job_status(&cells), JobStatus::Success);
    }

    #[test]
    fn job_status_is_partial_failure_when_mixed() {
        let cells = vec![cell(CellStatus::Success), cell(CellStatus::Failed)];
        assert_eq!(
            BuildReceipt::derive_job_status(&cells),
            JobStatus::PartialFailure
        );
    }

    #[test]
    fn job_status_is_failed_when_none_succeed() {
        let cells = vec![cell(CellStatus::Failed)];
        assert_eq!(BuildReceipt::derive_job_status(&cells), JobStatus::Failed);
    }
}
