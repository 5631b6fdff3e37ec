//! The *link* phase: one invocation of the compiler driver over a cell's objects.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reforge_common::{ElfMetadata, Sha256Hex};

use crate::process;
use crate::profile::BuildProfile;
use crate::receipt::{ArtifactDescriptor, PhaseRecord};

/// Links `objects` into a single ELF named `binary_name` under `cell_dir/bin`.
///
/// Returns the link phase record and, on success, the resulting artifact descriptor with real ELF
/// metadata populated from the produced binary. The artifact's `relative_path` is the path
/// relative to `cell_dir`, i.e. `bin/{binary_name}`.
pub fn link_cell(
    profile: &BuildProfile,
    objects: &[PathBuf],
    binary_name: &str,
    cell_dir: &Path,
    timeout: Duration,
) -> (PhaseRecord, Option<ArtifactDescriptor>) {
    let bin_dir = cell_dir.join("bin");
    let binary_path = bin_dir.join(binary_name);
    let relative_path = format!("bin/{binary_name}");
    let log_path = cell_dir.join("logs").join("link.log");

    let mut args: Vec<String> = objects.iter().map(|p| p.display().to_string()).collect();
    args.extend(profile.link_lib_flags());
    args.push("-o".to_string());
    args.push(binary_path.display().to_string());

    let _ = std::fs::create_dir_all(&bin_dir);
    let phase = process::run(&profile.compiler, &args, cell_dir, timeout, &log_path);

    let artifact = if phase.succeeded() && binary_path.is_file() {
        std::fs::read(&binary_path).ok().map(|bytes| {
            let elf_metadata = ElfMetadata::parse(&bytes).ok();
            ArtifactDescriptor {
                relative_path: relative_path.clone(),
                sha256: Sha256Hex::of_bytes(&bytes),
                size_bytes: bytes.len() as u64,
                elf_metadata,
            }
        })
    } else {
        None
    };

    (phase, artifact)
}
