//! Error types for blueprint reading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for blueprint operations
pub type BlueprintResult<T> = Result<T, BlueprintError>;

/// Reasons a blueprint document is malformed
///
/// Every variant is fatal for a run and is reported as a malformed
/// blueprint; the variants only differ in the context they carry.
#[derive(Debug, Error)]
pub enum BlueprintError {
    /// Failed to read the blueprint file
    #[error("failed to read blueprint {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not YAML
    #[error("failed to parse YAML in {file}: {source}")]
    ParseYaml {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The top-level `blueprint:` mapping is absent
    #[error("{file} does not contain a blueprint definition")]
    NotABlueprint { file: String },

    /// A required metadata key is absent or has the wrong type
    #[error("blueprint key '{key}' is missing or invalid: {reason}")]
    InvalidMetadata { key: String, reason: String },

    /// The blueprint targets a domain the harness cannot instantiate
    #[error("blueprint domain is '{domain}', only 'automation' blueprints can be validated")]
    UnsupportedDomain { domain: String },

    /// An input declaration is not usable
    #[error("input '{input}' is invalid: {reason}")]
    InvalidInput { input: String, reason: String },

    /// An input declaration has no selector, or one that cannot be read
    #[error("input '{input}' has no recognizable selector: {reason}")]
    MissingSelector { input: String, reason: String },

    /// The same input name appears twice (usually across sections)
    #[error("input '{input}' is declared more than once")]
    DuplicateInput { input: String },
}
