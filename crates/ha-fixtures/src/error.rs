//! Error types for input synthesis

use thiserror::Error;

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// An input for which no value or fixture can be produced
///
/// All variants are reported as an unsupported selector for the named input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    /// The selector kind has no synthesis rule and no default was declared
    #[error("input '{input}' uses selector '{selector}', which has no synthesis rule; declare a default or supply a value")]
    UnsupportedSelector { input: String, selector: String },

    /// A referenced entity lives in a domain no fixture can be declared for
    #[error("input '{input}' references domain '{domain}', for which no fixture entity can be declared")]
    UnsupportedDomain { input: String, domain: String },

    /// A supplied entity id differs from the one its fixture would get
    #[error("input '{input}' references '{entity_id}', which a fixture declared by name cannot reproduce")]
    UndeclarableEntity { input: String, entity_id: String },

    /// The selector is supported but gives nothing to pick from
    #[error("input '{input}' cannot be synthesized: {reason}")]
    NoPlaceholder { input: String, reason: String },
}

impl SynthesisError {
    /// The input that could not be synthesized
    pub fn input(&self) -> &str {
        match self {
            Self::UnsupportedSelector { input, .. }
            | Self::UnsupportedDomain { input, .. }
            | Self::UndeclarableEntity { input, .. }
            | Self::NoPlaceholder { input, .. } => input,
        }
    }
}
