//! Binary Module
//!
//! Native binary lifecycle: discover the installed engine binary, compare it
//! with what the bucket publishes for this platform, and swap it atomically.
//!
//! ## Layout
//! ```text
//! bucket:  release/{platform_tag}/{semver}-{base_name}
//!          e.g. release/mac-aarch64/0.0.5-libikv.dylib
//!
//! local:   {mount_dir}/bin/{semver}-{base_name}
//!          (single slot, at most one binary)
//! ```
//!
//! ## Replacement
//! ```text
//! remote stream ──► bin/.download-XXXX ──fsync──► rename ──► bin/0.0.5-libikv.so
//!                                                   │
//!                                                   └──► delete every other file
//! ```
//! The old binary stays in place until the rename succeeds.

mod asset;
mod cancel;
mod local;
mod manager;
mod remote;
mod s3;

pub use asset::BinaryAsset;
pub use cancel::CancellationFlag;
pub use local::LocalBinaryStore;
pub use manager::BinaryLifecycleManager;
pub use remote::{file_name_of, DirectoryRepository, RemoteBinaryRepository};
pub use s3::S3Repository;

/// Reference chunk size for streaming downloads (8 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;
