//! The `SourceSnapshot`: an ordered, content-hashed, immutable set of input files.

use std::path::{Path, PathBuf};

use reforge_common::{RollingHasher, Sha256Hex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot source file not found: {0}")]
    MissingFile(PathBuf),
    #[error("failed to read snapshot source file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot must contain at least one .c translation unit")]
    NoTranslationUnits,
}

/// One file in a `SourceSnapshot`, identified by its path relative to the snapshot root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub relative_path: String,
    pub content_sha256: Sha256Hex,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// A frozen, ordered collection of source files plus the archive hash over all of them.
///
/// The snapshot is immutable once built: the builder never mutates `files` after construction,
/// and every downstream hash (object hashes, artifact hashes) is ultimately rooted in
/// `archive_sha256`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub files: Vec<SnapshotFile>,
    pub archive_sha256: Sha256Hex,
}

impl SourceSnapshot {
    /// Builds a snapshot from `(relative_path, bytes)` pairs. The input order does not matter:
    /// files are normalized by sorting on `relative_path` before hashing, so that the archive
    /// hash is independent of submission order.
    pub fn from_files(files: Vec<(String, Vec<u8>)>) -> Result<Self, SnapshotError> {
        let mut files: Vec<SnapshotFile> = files
            .into_iter()
            .map(|(relative_path, bytes)| SnapshotFile {
                content_sha256: Sha256Hex::of_bytes(&bytes),
                relative_path,
                bytes,
            })
            .collect();
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        if !files.iter().any(|f| f.relative_path.ends_with(".c")) {
            return Err(SnapshotError::NoTranslationUnits);
        }

        let mut hasher = RollingHasher::new();
        for file in &files {
            hasher
                .update(file.relative_path.as_bytes())
                .update(&[0u8])
                .update(&file.bytes)
                .update(&[0u8]);
        }

        Ok(SourceSnapshot {
            files,
            archive_sha256: hasher.finish(),
        })
    }

    /// Reads a snapshot from files already materialized under `root`, given their paths relative
    /// to `root`.
    pub fn from_disk(root: &Path, relative_paths: &[String]) -> Result<Self, SnapshotError> {
        let mut files = Vec::with_capacity(relative_paths.len());
        for relative_path in relative_paths {
            let full_path = root.join(relative_path);
            if !full_path.is_file() {
                return Err(SnapshotError::MissingFile(full_path));
            }
            let bytes = std::fs::read(&full_path).map_err(|source| SnapshotError::Read {
                path: full_path.clone(),
                source,
            })?;
            files.push((relative_path.clone(), bytes));
        }
        Self::from_files(files)
    }

    /// Writes every file in the snapshot beneath `dest_root`, creating parent directories as
    /// needed. Used by the builder to materialize `{root}/{name}/src/...`.
    pub fn materialize(&self, dest_root: &Path) -> std::io::Result<()> {
        for file in &self.files {
            let dest_path = dest_root.join(&file.relative_path);
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&dest_path, &file.bytes)?;
        }
        Ok(())
    }

    /// All `.c` translation units, in the snapshot's normalized order.
    pub fn translation_units(&self) -> impl Iterator<Item = &SnapshotFile> {
        self.files.iter().filter(|f| f.relative_path.ends_with(".c"))
    }
}
