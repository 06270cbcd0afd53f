//! Binary Lifecycle Manager
//!
//! Decides whether to keep the installed binary or replace it with a newer
//! published one.
//!
//! ## Responsibilities
//! - Ensure `{mount_dir}/bin` exists
//! - Compare the local binary against the highest remote version
//! - Never downgrade, never re-fetch an equal version
//! - Swap binaries atomically (old binary kept until the new one is in place)

use std::path::{Path, PathBuf};

use crate::binary::{
    file_name_of, BinaryAsset, CancellationFlag, LocalBinaryStore, RemoteBinaryRepository,
    DEFAULT_CHUNK_SIZE,
};
use crate::error::{IkvError, Result};
use crate::platform::PlatformTag;

/// Resolves which native binary to load
pub struct BinaryLifecycleManager {
    /// `{mount_dir}/bin` slot
    local: LocalBinaryStore,

    /// Published binaries
    remote: Box<dyn RemoteBinaryRepository>,

    /// Host platform; `None` disables remote lookups
    platform: Option<PlatformTag>,

    /// Read size while streaming a download
    chunk_size: usize,

    /// Checked between download chunks
    cancel: CancellationFlag,
}

impl BinaryLifecycleManager {
    /// Manager for `mount_dir` on the running host's platform
    pub fn new(mount_dir: impl AsRef<Path>, remote: Box<dyn RemoteBinaryRepository>) -> Self {
        Self {
            local: LocalBinaryStore::new(mount_dir),
            remote,
            platform: PlatformTag::resolve(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: CancellationFlag::new(),
        }
    }

    /// Override the detected platform (`None` = unsupported host)
    pub fn with_platform(mut self, platform: Option<PlatformTag>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Path of the binary to load, downloading a newer one if published.
    ///
    /// 1. Ensure the local directory exists
    /// 2. Read the local asset (may be absent)
    /// 3. Unsupported platform → local path (or `None`)
    /// 4. Nothing published → local path (or `None`)
    /// 5. Local version >= remote version → local path
    /// 6. Otherwise download remote and swap it in
    ///
    /// `Ok(None)` means no binary could be provisioned; callers treat that as
    /// fatal for startup.
    pub fn resolve_binary_path(&self) -> Result<Option<PathBuf>> {
        // Step 1
        self.local.ensure_directory()?;

        // Step 2
        let local = self.local.list_local()?;
        let local_path = local.as_ref().map(|asset| PathBuf::from(&asset.location));
        match &local {
            Some(asset) => tracing::debug!("Local binary {} at {}", asset.version, asset.location),
            None => tracing::debug!("No local binary in {}", self.local.bin_dir().display()),
        }

        // Step 3
        let Some(platform) = self.platform else {
            tracing::warn!("Unsupported host platform, skipping remote lookup");
            return Ok(local_path);
        };

        // Step 4
        let remote = match self.remote.list_remote(platform) {
            Ok(Some(asset)) => asset,
            Ok(None) => {
                tracing::info!("No remote binary published for {}", platform);
                return Ok(local_path);
            }
            Err(e) if local_path.is_some() => {
                tracing::warn!("Remote listing failed, keeping local binary: {}", e);
                return Ok(local_path);
            }
            Err(e) => return Err(e),
        };

        // Step 5
        if let Some(local) = &local {
            if remote.version <= local.version {
                tracing::debug!(
                    "Local binary {} is current (remote {})",
                    local.version,
                    remote.version
                );
                return Ok(local_path);
            }
        }

        // Step 6
        tracing::info!(
            "Downloading {} (local {})",
            remote.location,
            local.as_ref().map_or("none".to_string(), |a| a.version.to_string())
        );
        self.install(&remote)
    }

    /// Fetch `remote` and swap it into the local slot.
    ///
    /// A failed fetch returns `Ok(None)`; the previous binary (if any) stays
    /// installed. Cancellation and local I/O failures are errors.
    fn install(&self, remote: &BinaryAsset) -> Result<Option<PathBuf>> {
        let file_name = file_name_of(&remote.location);

        let mut stream = match self.remote.fetch(&remote.location) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Cannot fetch {}: {}", remote.location, e);
                return Ok(None);
            }
        };

        match self
            .local
            .replace(stream.as_mut(), file_name, self.chunk_size, &self.cancel)
        {
            Ok(path) => {
                tracing::info!("Installed native binary {} at {}", remote.version, path.display());
                Ok(Some(path))
            }
            Err(IkvError::Fetch(msg)) => {
                tracing::error!("Download of {} failed: {}", remote.location, msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The local slot this manager maintains
    pub fn local_store(&self) -> &LocalBinaryStore {
        &self.local
    }

    pub fn platform(&self) -> Option<PlatformTag> {
        self.platform
    }
}
