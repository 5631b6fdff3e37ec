//! The *strip* phase: applied only to the `stripped` variant's linked binary.

use std::path::Path;
use std::time::Duration;

use reforge_common::{ElfMetadata, Sha256Hex};

use crate::process;
use crate::profile::BuildProfile;
use crate::receipt::{ArtifactDescriptor, PhaseRecord};

/// Strips `binary_path` in place and re-reads it to build a fresh artifact descriptor.
///
/// `binary_relative_path` is the artifact's path relative to `cell_dir` (e.g. `bin/{name}`),
/// carried through unchanged since stripping happens in place.
pub fn strip_binary(
    profile: &BuildProfile,
    binary_relative_path: &str,
    binary_path: &Path,
    cell_dir: &Path,
    timeout: Duration,
) -> (PhaseRecord, Option<ArtifactDescriptor>) {
    let log_path = cell_dir.join("logs").join("strip.log");
    let args = vec!["--strip-all".to_string(), binary_path.display().to_string()];
    let phase = process::run(&profile.strip_tool, &args, cell_dir, timeout, &log_path);

    let artifact = if phase.succeeded() && binary_path.is_file() {
        std::fs::read(binary_path).ok().map(|bytes| {
            let elf_metadata = ElfMetadata::parse(&bytes).ok();
            ArtifactDescriptor {
                relative_path: binary_relative_path.to_string(),
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

/// True iff the `.debug_*` sections were actually removed, per the variant's required
/// post-condition.
pub fn verify_stripped(bytes: &[u8]) -> bool {
    ElfMetadata::is_fully_stripped(bytes).unwrap_or(false)
}
