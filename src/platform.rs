//! Host platform resolution
//!
//! Maps (operating system, CPU architecture) to the family of native
//! binaries published for it. Remote objects live under
//! `release/{platform_tag}/`.

use std::fmt;

/// Root prefix of all published binaries in the bucket
pub const RELEASE_PREFIX: &str = "release";

/// Platforms for which a native engine binary is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformTag {
    LinuxX86_64,
    LinuxAarch64,
    MacAarch64,
}

impl PlatformTag {
    /// Resolve the tag of the running host.
    pub fn resolve() -> Option<Self> {
        Self::resolve_for(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve a tag from an OS name and machine architecture.
    ///
    /// Matching is case-insensitive. Unsupported combinations yield `None`.
    pub fn resolve_for(os: &str, arch: &str) -> Option<Self> {
        let os = os.to_lowercase();
        let arch = arch.to_lowercase();

        match (os.as_str(), arch.as_str()) {
            ("linux", "x86_64" | "amd64") => Some(Self::LinuxX86_64),
            ("linux", "arm64" | "aarch64") => Some(Self::LinuxAarch64),
            ("darwin" | "mac" | "macos", "arm64" | "aarch64") => Some(Self::MacAarch64),
            _ => None,
        }
    }

    /// Tag as used in object keys, e.g. "linux-x86_64"
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinuxX86_64 => "linux-x86_64",
            Self::LinuxAarch64 => "linux-aarch64",
            Self::MacAarch64 => "mac-aarch64",
        }
    }

    /// Object storage prefix, e.g. "release/mac-aarch64"
    pub fn remote_prefix(&self) -> String {
        format!("{}/{}", RELEASE_PREFIX, self.as_str())
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
