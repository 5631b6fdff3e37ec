//! Content hashing used for cross-stage provenance keys.
//!
//! Every hash in this pipeline is a lowercase hex-encoded SHA-256 digest. Using a single
//! algorithm everywhere means a `binary_sha256` computed by the builder, the DWARF oracle, or a
//! join stage is always directly comparable without a conversion step.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A lowercase hex-encoded SHA-256 digest.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha256Hex([u8; 32]);

impl Sha256Hex {
    /// Hashes a byte slice.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Wraps an already-computed 32-byte digest, e.g. one parsed from a hex string supplied on
    /// the command line.
    pub fn from_bytes(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Hashes the contents of a file on disk.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::of_bytes(&data))
    }

    /// Returns the lowercase hex representation.
    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hex({self})")
    }
}

/// Incrementally hashes a sequence of byte chunks into a single digest.
///
/// Used to compute the `SourceSnapshot` archive hash over a normalized, ordered list of
/// `(relative_path, bytes)` pairs without materializing a tar archive.
#[derive(Default)]
pub struct RollingHasher {
    hasher: Sha256,
}

impl RollingHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.hasher.update(data);
        self
    }

    pub fn finish(self) -> Sha256Hex {
        Sha256Hex(self.hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = Sha256Hex::of_bytes(b"hello world");
        let b = Sha256Hex::of_bytes(b"hello world");
        assert_eq!(a, b);
        assert_eq!(
            a.to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
    }

    #[test]
    fn rolling_hash_matches_concatenation() {
        let mut rolling = RollingHasher::new();
        rolling.update(b"hello ").update(b"world");
        let rolled = rolling.finish();
        let flat = Sha256Hex::of_bytes(b"hello world");
        assert_eq!(rolled, flat);
    }
}
