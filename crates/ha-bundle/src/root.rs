//! Bundle root naming
//!
//! Roots are derived from an explicit seed instead of a process-wide
//! counter, so concurrent runs only collide when handed the same seed.

use crate::error::{BundleError, BundleResult};
use std::fmt;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Directory name prefix of every bundle root
pub const BUNDLE_PREFIX: &str = "ha-blueprint-check";

/// The unique part of a bundle root name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootSeed(String);

impl RootSeed {
    /// A caller-chosen seed; ASCII alphanumerics, `-` and `_` only
    pub fn new(seed: impl Into<String>) -> BundleResult<Self> {
        let seed = seed.into();
        let invalid = |reason: &str| BundleError::InvalidSeed {
            seed: seed.clone(),
            reason: reason.to_string(),
        };

        if seed.is_empty() {
            return Err(invalid("seed is empty"));
        }
        if seed.len() > 64 {
            return Err(invalid("seed is longer than 64 characters"));
        }
        if !seed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("only ASCII letters, digits, '-' and '_' are allowed"));
        }
        Ok(Self(seed))
    }

    /// A fresh ULID seed
    pub fn random() -> Self {
        Self(Ulid::new().to_string().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps seeds to bundle roots below one parent directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRootGenerator {
    parent: PathBuf,
}

impl BundleRootGenerator {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
        }
    }

    /// Roots below the system temporary directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// `<parent>/ha-blueprint-check-<seed>`
    pub fn root_for(&self, seed: &RootSeed) -> PathBuf {
        self.parent.join(format!("{}-{}", BUNDLE_PREFIX, seed))
    }

    /// Root for a fresh random seed
    pub fn next_root(&self) -> PathBuf {
        self.root_for(&RootSeed::random())
    }
}

impl Default for BundleRootGenerator {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}
