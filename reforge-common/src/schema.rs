//! The header every on-disk output carries, per the on-disk layout contract.

use serde::{Deserialize, Serialize};

use crate::hash::Sha256Hex;

/// Schema version for a single output document. Bumped whenever a stage's JSON shape changes
/// in a way that is not purely additive.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the pipeline as a whole, independent of which crate emitted a given document.
pub const PACKAGE_NAME: &str = "reforge";

/// Pipeline-wide release version, independent of individual crate versions.
pub const PACKAGE_VERSION: &str = "0.1.0";

/// Common header embedded at the top level of every stage output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputHeader {
    pub package_name: String,
    pub version: String,
    pub schema_version: u32,
    pub profile_id: String,
    pub binary_sha256: Sha256Hex,
}

impl OutputHeader {
    pub fn new(profile_id: impl Into<String>, binary_sha256: Sha256Hex) -> Self {
        Self {
            package_name: PACKAGE_NAME.to_string(),
            version: PACKAGE_VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
            profile_id: profile_id.into(),
            binary_sha256,
        }
    }
}
