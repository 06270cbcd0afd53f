//! Semantic versions of native binaries
//!
//! Versions are only ever built through [`SemanticVersion::parse`], so a value
//! of this type always came from a string matching
//! `major.minor.patch[-prerelease][+build]`.
//!
//! ## Ordering
//! Precedence is `(major, minor, patch)` only. Prerelease and build metadata
//! are carried but ignored by both `Ord` and `PartialEq`, so `1.0.0-rc.1`
//! and `1.0.0` compare equal. A remote binary must therefore bump at least
//! the patch number to replace a local one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IkvError, Result};

static SEMVER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([\w.]+))?(?:\+([\w.]+))?$")
        .expect("semver pattern is a valid regex")
});

/// A parsed `major.minor.patch[-prerelease][+build]` version
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    major: u64,
    minor: u64,
    patch: u64,
    prerelease: Option<String>,
    build: Option<String>,
}

impl SemanticVersion {
    /// Parse a version string, rejecting anything that does not match the
    /// full pattern.
    pub fn parse(text: &str) -> Result<Self> {
        let captures = SEMVER_PATTERN
            .captures(text)
            .ok_or_else(|| IkvError::VersionParse(text.to_string()))?;

        let number = |idx: usize| -> Result<u64> {
            captures[idx]
                .parse::<u64>()
                .map_err(|_| IkvError::VersionParse(text.to_string()))
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            prerelease: captures.get(4).map(|m| m.as_str().to_string()),
            build: captures.get(5).map(|m| m.as_str().to_string()),
        })
    }

    /// Version encoded in a binary's file name.
    ///
    /// "0.0.3-libikv.so" → Some(0.0.3), "0.0.4" → Some(0.0.4),
    /// "libikv.so" → None
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let leading = file_name.split('-').next()?;
        Self::parse(leading).ok()
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    fn precedence(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = IkvError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.precedence() == other.precedence()
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence().cmp(&other.precedence())
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}
