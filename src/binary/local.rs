//! Local Binary Store
//!
//! A single-slot store for the installed engine binary under
//! `{mount_dir}/bin`. The directory is owned by this store; nothing else
//! should write there.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::binary::{BinaryAsset, CancellationFlag};
use crate::error::{IkvError, Result};
use crate::version::SemanticVersion;

/// Manages `{mount_dir}/bin`
#[derive(Debug, Clone)]
pub struct LocalBinaryStore {
    bin_dir: PathBuf,
}

impl LocalBinaryStore {
    const BIN_DIR: &'static str = "bin";

    /// Prefix of in-progress downloads. Never parses as a version.
    const PARTIAL_PREFIX: &'static str = ".download-";

    /// Partial downloads untouched for this long are abandoned. Younger ones
    /// may belong to another process sharing the mount directory.
    const STALE_PARTIAL_AGE: Duration = Duration::from_secs(60 * 60);

    pub fn new(mount_dir: impl AsRef<Path>) -> Self {
        Self {
            bin_dir: mount_dir.as_ref().join(Self::BIN_DIR),
        }
    }

    /// Create `{mount_dir}/bin` (and parents) if absent
    pub fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.bin_dir)?;
        Ok(())
    }

    /// The installed binary, if any.
    ///
    /// Considers files whose leading dash-delimited segment parses as a
    /// version and returns the highest one (a crash between install and
    /// cleanup can leave two). Files that don't parse are ignored.
    pub fn list_local(&self) -> Result<Option<BinaryAsset>> {
        if !self.bin_dir.is_dir() {
            return Ok(None);
        }

        let mut highest: Option<BinaryAsset> = None;
        for entry in fs::read_dir(&self.bin_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let Some(version) = SemanticVersion::from_file_name(file_name) else {
                continue;
            };

            let is_higher = highest
                .as_ref()
                .map_or(true, |current| version > current.version);
            if is_higher {
                highest = Some(BinaryAsset::new(
                    version,
                    path.to_string_lossy().into_owned(),
                ));
            }
        }

        Ok(highest)
    }

    /// Atomically install a new binary named `file_name` from `source`.
    ///
    /// Steps:
    /// 1. Stream `source` into a temp file inside the bin directory
    /// 2. fsync and rename it to `{bin_dir}/{file_name}`
    /// 3. Delete every other binary and abandoned partial download
    ///
    /// On error or cancellation the temp file is removed and the previously
    /// installed binary is left untouched. An empty source is a fetch error.
    ///
    /// Other processes may install into the same directory concurrently:
    /// their in-progress downloads are left alone, and if ours vanishes
    /// before the rename while `file_name` has been installed by someone
    /// else, that install is accepted.
    pub fn replace(
        &self,
        source: &mut dyn Read,
        file_name: &str,
        chunk_size: usize,
        cancel: &CancellationFlag,
    ) -> Result<PathBuf> {
        if file_name.is_empty()
            || Path::new(file_name).file_name().and_then(|n| n.to_str()) != Some(file_name)
        {
            return Err(IkvError::Fetch(format!(
                "refusing to install binary with file name {:?}",
                file_name
            )));
        }

        self.ensure_directory()?;

        // Dropped (and deleted) on every early return below
        let mut partial = tempfile::Builder::new()
            .prefix(Self::PARTIAL_PREFIX)
            .tempfile_in(&self.bin_dir)?;

        let mut chunk = vec![0u8; chunk_size.max(1)];
        let mut written: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Download of {} cancelled after {} bytes", file_name, written);
                return Err(IkvError::Cancelled);
            }

            let read = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(IkvError::Fetch(format!(
                        "stream for {} failed after {} bytes: {}",
                        file_name, written, e
                    )))
                }
            };

            partial.write_all(&chunk[..read])?;
            written += read as u64;
        }

        if written == 0 {
            return Err(IkvError::Fetch(format!("empty body for {}", file_name)));
        }

        partial.as_file().sync_all()?;

        let target = self.bin_dir.join(file_name);
        match partial.persist(&target) {
            Ok(_) => tracing::debug!("Installed {} ({} bytes)", target.display(), written),
            Err(e) if target.is_file() => {
                tracing::debug!(
                    "{} already installed by another process ({})",
                    target.display(),
                    e.error
                );
            }
            Err(e) => return Err(IkvError::Io(e.error)),
        }

        let removed = self.remove_all_except(&target)?;
        if removed > 0 {
            tracing::debug!("Removed {} stale file(s) from {}", removed, self.bin_dir.display());
        }

        Ok(target)
    }

    /// Delete every file in the bin directory other than `keep`, sparing
    /// partial downloads younger than `STALE_PARTIAL_AGE`
    fn remove_all_except(&self, keep: &Path) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.bin_dir)? {
            let path = entry?.path();
            if !path.is_file() || path == keep || self.is_live_partial(&path) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                // Raced with another process's cleanup
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    /// A partial download that may still be written by someone
    fn is_live_partial(&self, path: &Path) -> bool {
        let is_partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(Self::PARTIAL_PREFIX));
        if !is_partial {
            return false;
        }

        let modified = fs::metadata(path).and_then(|m| m.modified());
        match modified {
            Ok(time) => SystemTime::now()
                .duration_since(time)
                .map_or(true, |age| age < Self::STALE_PARTIAL_AGE),
            // Vanished or unreadable: not ours to delete
            Err(_) => true,
        }
    }

    /// Path of the bin directory
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }
}
