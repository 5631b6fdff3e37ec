//! Top-level orchestration: materializes the snapshot, discovers the toolchain, preprocesses
//! every translation unit, then builds all 12 matrix cells over a bounded worker pool.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use reforge_common::{Cell, ReforgeConfig, Variant};
use thiserror::Error;

use crate::compile;
use crate::link;
use crate::preprocess;
use crate::profile::BuildProfile;
use crate::receipt::{BuildCell, BuildReceipt, CellFlag, CellStatus};
use crate::snapshot::SourceSnapshot;
use crate::strip;
use crate::toolchain::{self, ToolchainError};

pub const BUILDER_NAME: &str = "reforge-builder";
pub const BUILDER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("toolchain discovery failed")]
    Toolchain(#[from] ToolchainError),
    #[error("failed to materialize source snapshot")]
    Materialize(#[source] std::io::Error),
    #[error("failed to create job output directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one full builder job: preprocess, then build every cell of the matrix, then emit the
/// receipt. `output_root` is created fresh beneath the caller's job directory.
pub fn run_job(
    snapshot: &SourceSnapshot,
    profile: &BuildProfile,
    config: &ReforgeConfig,
    output_root: &Path,
    binary_name: &str,
) -> Result<BuildReceipt, BuilderError> {
    let src_dir = output_root.join("src");
    let preprocess_dir = output_root.join("preprocess");
    std::fs::create_dir_all(&src_dir).map_err(|source| BuilderError::CreateDir {
        path: src_dir.clone(),
        source,
    })?;
    std::fs::create_dir_all(&preprocess_dir).map_err(|source| BuilderError::CreateDir {
        path: preprocess_dir.clone(),
        source,
    })?;
    snapshot
        .materialize(&src_dir)
        .map_err(BuilderError::Materialize)?;

    let toolchain = toolchain::discover(&profile.compiler, &profile.strip_tool)?;
    tracing::info!(
        compiler = %toolchain.compiler_path,
        strip_tool = %toolchain.strip_tool_path,
        "toolchain resolved"
    );

    let preprocess_units: Vec<_> = snapshot
        .translation_units()
        .map(|tu| {
            preprocess::preprocess_unit(
                profile,
                tu,
                &src_dir,
                &preprocess_dir,
                config.timeouts.preprocess,
            )
        })
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.resolved_worker_threads())
        .build()
        .unwrap_or_else(|_| rayon::ThreadPoolBuilder::new().build().expect("default pool"));

    let cells: Vec<BuildCell> = pool.install(|| {
        Cell::matrix()
            .into_par_iter()
            .map(|cell| build_cell(snapshot, profile, config, &src_dir, output_root, cell, binary_name))
            .collect()
    });

    let job_status = BuildReceipt::derive_job_status(&cells);
    tracing::info!(?job_status, cells = cells.len(), "build job finished");

    Ok(BuildReceipt {
        builder_name: BUILDER_NAME.to_string(),
        builder_version: BUILDER_VERSION.to_string(),
        snapshot_archive_sha256: snapshot.archive_sha256.clone(),
        toolchain,
        profile: profile.clone(),
        preprocess: preprocess_units,
        cells,
        job_status,
    })
}

fn build_cell(
    snapshot: &SourceSnapshot,
    profile: &BuildProfile,
    config: &ReforgeConfig,
    src_dir: &Path,
    output_root: &Path,
    cell: Cell,
    binary_name: &str,
) -> BuildCell {
    let cell_dir = output_root.join(cell.rel_dir());
    if std::fs::create_dir_all(&cell_dir).is_err() {
        return BuildCell {
            cell,
            status: CellStatus::Failed,
            compile_units: Vec::new(),
            link: None,
            strip: None,
            flags: vec![CellFlag::BuildFailed],
            artifact: None,
        };
    }

    let mut flags = Vec::new();

    let compile_units: Vec<_> = snapshot
        .translation_units()
        .map(|tu| {
            compile::compile_unit(
                profile,
                tu,
                cell.variant,
                cell.opt_level.as_flag(),
                src_dir,
                &cell_dir,
                config.timeouts.compile,
            )
        })
        .collect();

    if compile_units.iter().any(|u| u.phase.timed_out) {
        flags.push(CellFlag::Timeout);
    }
    if compile_units.iter().any(|u| !u.phase.succeeded()) {
        flags.push(CellFlag::CompileUnitFailed);
        return BuildCell {
            cell,
            status: CellStatus::Failed,
            compile_units,
            link: None,
            strip: None,
            flags,
            artifact: None,
        };
    }

    let objects: Vec<PathBuf> = compile_units
        .iter()
        .map(|u| {
            cell_dir
                .join("obj")
                .join(u.source_relative_path.replace('/', "__").replace(".c", ".o"))
        })
        .collect();

    let (link_phase, mut artifact) =
        link::link_cell(profile, &objects, binary_name, &cell_dir, config.timeouts.link);

    if link_phase.timed_out {
        flags.push(CellFlag::Timeout);
    }
    if !link_phase.succeeded() {
        flags.push(CellFlag::LinkFailed);
        return BuildCell {
            cell,
            status: CellStatus::Failed,
            compile_units,
            link: Some(link_phase),
            strip: None,
            flags,
            artifact: None,
        };
    }
    if artifact.is_none() {
        flags.push(CellFlag::NoArtifact);
    }

    let mut strip_phase = None;
    if cell.variant == Variant::Stripped {
        let binary_relative_path = format!("bin/{binary_name}");
        let binary_path = cell_dir.join("bin").join(binary_name);
        let (phase, stripped_artifact) = strip::strip_binary(
            profile,
            &binary_relative_path,
            &binary_path,
            &cell_dir,
            config.timeouts.strip,
        );
        if phase.timed_out {
            flags.push(CellFlag::Timeout);
        }
        if !phase.succeeded() {
            flags.push(CellFlag::StripFailed);
        } else if let Some(stripped) = &stripped_artifact {
            if let Ok(bytes) = std::fs::read(&binary_path) {
                if !strip::verify_stripped(&bytes) {
                    flags.push(CellFlag::StripExpectedMissing);
                }
            }
            artifact = Some(stripped.clone());
        }
        strip_phase = Some(phase);
    } else if cell.variant == Variant::Debug {
        let has_debug = artifact
            .as_ref()
            .and_then(|a| a.elf_metadata.as_ref())
            .map(|m| m.has_debug_info && m.has_debug_line)
            .unwrap_or(false);
        if !has_debug {
            flags.push(CellFlag::DebugExpectedMissing);
        }
    }

    let status = if flags.iter().any(|f| {
        matches!(
            f,
            CellFlag::BuildFailed | CellFlag::CompileUnitFailed | CellFlag::LinkFailed | CellFlag::StripFailed
        )
    }) {
        CellStatus::Failed
    } else {
        CellStatus::Success
    };

    BuildCell {
        cell,
        status,
        compile_units,
        link: Some(link_phase),
        strip: strip_phase,
        flags,
        artifact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::BuildProfile;

    #[test]
    fn job_requires_compiler_on_path() {
        let snapshot = SourceSnapshot::from_files(vec![(
            "main.c".to_string(),
            b"int main(void) { return 0; }".to_vec(),
        )])
        .unwrap();
        let mut profile = BuildProfile::synthetic_default();
        profile.compiler = "reforge-nonexistent-cc-xyz".to_string();
        let config = ReforgeConfig::default();
        let dir = tempfile::tempdir().unwrap();

        let result = run_job(&snapshot, &profile, &config, dir.path(), "job");
        assert!(matches!(result, Err(BuilderError::Toolchain(_))));
    }
}
