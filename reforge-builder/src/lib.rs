//! Compiles a frozen [`SourceSnapshot`] across the optimization x variant matrix and emits a
//! single authoritative [`BuildReceipt`].
//!
//! The builder owns the on-disk snapshot, artifacts, and preprocessed `.i` files beneath a job's
//! output directory; no other stage in this workspace writes there.

mod builder;
mod compile;
mod link;
mod preprocess;
mod process;
mod profile;
mod receipt;
mod snapshot;
mod strip;
mod toolchain;

pub use builder::{run_job, BuilderError, BUILDER_NAME, BUILDER_VERSION};
pub use profile::BuildProfile;
pub use receipt::{
    ArtifactDescriptor, BuildCell, BuildReceipt, CellFlag, CellStatus, CompileUnitRecord,
    JobStatus, PhaseRecord, PreprocessUnit, ToolchainIdentity,
};
pub use snapshot::{SnapshotError, SnapshotFile, SourceSnapshot};
pub use toolchain::ToolchainError;
