//! Atomic, deterministic JSON output.
//!
//! Every stage writes its reports through [`write_json_atomic`] so that a crash or a cancelled
//! job never leaves a half-written file behind: the document is serialized to a temporary path
//! in the same directory and then renamed into place, which is atomic on the same filesystem.

use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create parent directory {path}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize output document")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write temporary file {path}")]
    WriteTemp {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to rename temporary file into place at {path}")]
    Rename {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Serializes `value` as pretty-printed, sorted-key JSON and atomically installs it at `path`.
///
/// `value`'s `Serialize` implementation is responsible for using `BTreeMap`/sorted `Vec`s so
/// that two runs over identical inputs produce byte-identical content; this function only
/// guarantees that the write itself is atomic, not that the content is canonical.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let body = serde_json::to_vec_pretty(value).map_err(WriteError::Serialize)?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("output")
    ));

    std::fs::write(&tmp_path, &body).map_err(|source| WriteError::WriteTemp {
        path: tmp_path.clone(),
        source,
    })?;

    std::fs::rename(&tmp_path, path).map_err(|source| WriteError::Rename {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = body.len(), "wrote JSON document");
    Ok(())
}

/// Appends newline-delimited JSON records to a file that is built up in a temporary location and
/// installed atomically, mirroring [`write_json_atomic`] for `.jsonl` outputs (decompiler and
/// join per-function rows).
pub fn write_jsonl_atomic<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), WriteError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut body = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut body, row).map_err(WriteError::Serialize)?;
        body.push(b'\n');
    }

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("output")
    ));

    std::fs::write(&tmp_path, &body).map_err(|source| WriteError::WriteTemp {
        path: tmp_path.clone(),
        source,
    })?;

    std::fs::rename(&tmp_path, path).map_err(|source| WriteError::Rename {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote JSONL document");
    Ok(())
}
