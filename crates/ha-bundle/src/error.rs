//! Error types for bundle assembly

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bundle operations
pub type BundleResult<T> = Result<T, BundleError>;

/// Errors raised while assembling or disposing of a bundle
///
/// The consistency variants indicate a defect in the harness rather than
/// in the blueprint under test.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A required input reached assembly without a value
    #[error("required input '{input}' has no value")]
    MissingInput { input: String },

    /// The automation would reference an entity that has no fixture
    #[error("input '{input}' references {entity_id}, which is not among the fixture entities")]
    DanglingReference { input: String, entity_id: String },

    /// A fixture is wired to a helper that has no fixture
    #[error("fixture {fixture} is backed by {backing}, which is not among the fixture entities")]
    DanglingBacking { fixture: String, backing: String },

    /// The seed cannot be used in a directory name
    #[error("invalid bundle seed '{seed}': {reason}")]
    InvalidSeed { seed: String, reason: String },

    /// Another run already owns this root
    #[error("bundle root {path} already exists")]
    RootExists { path: PathBuf },

    /// Failed to create a directory or write a file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to render generated YAML
    #[error("failed to serialize {file}: {source}")]
    Serialize {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Failed to remove the bundle tree
    #[error("failed to remove bundle {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
