//! The *compile* phase: one invocation of the compiler per translation unit per cell.

use std::path::Path;
use std::time::Duration;

use reforge_common::{Sha256Hex, Variant};

use crate::process;
use crate::profile::BuildProfile;
use crate::receipt::CompileUnitRecord;
use crate::snapshot::SnapshotFile;

/// Compiles `tu` into an object file under `cell_dir/obj`, returning its record.
///
/// The object is named after the TU's relative path with slashes flattened, so translation units
/// in different subdirectories never collide within a cell's object directory.
pub fn compile_unit(
    profile: &BuildProfile,
    tu: &SnapshotFile,
    variant: Variant,
    opt_flag: &str,
    source_root: &Path,
    cell_dir: &Path,
    timeout: Duration,
) -> CompileUnitRecord {
    let object_name = tu.relative_path.replace('/', "__").replace(".c", ".o");
    let object_path = cell_dir.join("obj").join(&object_name);
    let log_path = cell_dir.join("logs").join(format!("{object_name}.log"));

    let mut args = profile.compile_flags(variant, opt_flag);
    args.push(source_root.join(&tu.relative_path).display().to_string());
    args.push("-o".to_string());
    args.push(object_path.display().to_string());

    if let Some(parent) = object_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let phase = process::run(&profile.compiler, &args, cell_dir, timeout, &log_path);

    let object_sha256 = if phase.succeeded() && object_path.is_file() {
        std::fs::read(&object_path).ok().map(|bytes| Sha256Hex::of_bytes(&bytes))
    } else {
        None
    };

    CompileUnitRecord {
        source_relative_path: tu.relative_path.clone(),
        object_sha256,
        phase,
    }
}
