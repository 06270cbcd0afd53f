//! Remote Binary Repository
//!
//! Source of published engine binaries. Object keys are `/`-separated and
//! the final segment carries the version: `release/linux-x86_64/0.0.1-libikv.so`.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::binary::BinaryAsset;
use crate::error::{IkvError, Result};
use crate::platform::PlatformTag;
use crate::version::SemanticVersion;

/// Final path segment of an object key
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Lists and fetches binaries from object storage
pub trait RemoteBinaryRepository: Send + Sync {
    /// All object keys under `prefix`, in listing order
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Open a byte stream over the object at `key`.
    ///
    /// Callers must consume it sequentially; implementations must not buffer
    /// the whole object.
    fn fetch(&self, key: &str) -> Result<Box<dyn Read + Send>>;

    /// Highest-versioned binary published for `platform`.
    ///
    /// Keys whose file name doesn't parse as a version are skipped. Ties keep
    /// the first key encountered.
    fn list_remote(&self, platform: PlatformTag) -> Result<Option<BinaryAsset>> {
        let prefix = platform.remote_prefix();
        let mut highest: Option<BinaryAsset> = None;

        for key in self.list_keys(&prefix)? {
            let Some(version) = SemanticVersion::from_file_name(file_name_of(&key)) else {
                tracing::trace!("Skipping unversioned object {}", key);
                continue;
            };

            let is_higher = highest
                .as_ref()
                .map_or(true, |current| version > current.version);
            if is_higher {
                highest = Some(BinaryAsset::new(version, key));
            }
        }

        Ok(highest)
    }
}

/// Repository backed by a local directory tree (a mirror of the bucket).
///
/// Key `release/linux-x86_64/0.0.1-libikv.so` maps to
/// `{root}/release/linux-x86_64/0.0.1-libikv.so`.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    root: PathBuf,
}

impl DirectoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(IkvError::Fetch(format!("invalid object key: {}", key)));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

impl RemoteBinaryRepository for DirectoryRepository {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.path_for(prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = prefix.trim_end_matches('/');
        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                keys.push(format!("{}/{}", prefix, name));
            }
        }

        // S3 lists keys in lexicographic order
        keys.sort();
        Ok(keys)
    }

    fn fetch(&self, key: &str) -> Result<Box<dyn Read + Send>> {
        let path = self.path_for(key)?;
        let file = File::open(&path)
            .map_err(|e| IkvError::Fetch(format!("cannot open {}: {}", path.display(), e)))?;
        Ok(Box::new(file))
    }
}
