//! Located binaries tagged with their version

use crate::version::SemanticVersion;

/// A binary found locally (path) or remotely (object key)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryAsset {
    /// Version parsed from the file name
    pub version: SemanticVersion,

    /// Local filesystem path or remote object key
    pub location: String,
}

impl BinaryAsset {
    pub fn new(version: SemanticVersion, location: impl Into<String>) -> Self {
        Self {
            version,
            location: location.into(),
        }
    }
}
