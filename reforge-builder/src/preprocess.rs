//! The *preprocess* phase: independent of the optimization/variant matrix. Failure here is
//! non-fatal — a failed unit is marked and the rest of the job continues.

use std::path::Path;
use std::time::Duration;

use reforge_common::Sha256Hex;

use crate::process;
use crate::profile::BuildProfile;
use crate::receipt::PreprocessUnit;
use crate::snapshot::SnapshotFile;

/// Runs the compiler's preprocess-only mode (`-E`) over `tu`, producing one `.i` file.
pub fn preprocess_unit(
    profile: &BuildProfile,
    tu: &SnapshotFile,
    source_root: &Path,
    output_dir: &Path,
    timeout: Duration,
) -> PreprocessUnit {
    let output_name = tu.relative_path.replace('/', "__").replace(".c", ".i");
    let output_path = output_dir.join(&output_name);
    let log_path = output_dir.join("logs").join(format!("{output_name}.log"));

    let mut args = profile.preprocess_flags.clone();
    args.push("-E".to_string());
    args.push(source_root.join(&tu.relative_path).display().to_string());
    args.push("-o".to_string());
    args.push(output_path.display().to_string());

    let phase = process::run(&profile.compiler, &args, output_dir, timeout, &log_path);

    let output_sha256 = if phase.succeeded() && output_path.is_file() {
        std::fs::read(&output_path).ok().map(|bytes| Sha256Hex::of_bytes(&bytes))
    } else {
        None
    };

    PreprocessUnit {
        source_relative_path: tu.relative_path.clone(),
        output_relative_path: output_name,
        output_sha256,
        phase,
    }
}
