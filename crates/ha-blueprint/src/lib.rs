//! Blueprint loading for the validation harness
//!
//! This crate reads a Home Assistant automation blueprint and exposes the
//! part of it the harness needs: the declared inputs and their selectors.
//! Triggers, conditions and actions are never interpreted; the body is kept
//! verbatim so it can be copied into a configuration bundle.
//!
//! Blueprint bodies reference inputs with the `!input` tag, which is
//! preserved like any other custom tag:
//!
//! ```yaml
//! blueprint:
//!   name: Movie Mode
//!   domain: automation
//!   input:
//!     media_player:
//!       selector:
//!         entity:
//!           domain: media_player
//! triggers:
//!   - trigger: state
//!     entity_id: !input media_player
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ha_blueprint::BlueprintDocument;
//!
//! let blueprint = BlueprintDocument::load("movie_mode.yaml")?;
//! for (name, field) in blueprint.inputs() {
//!     println!("{name}: {} (required: {})", field.selector.tag(), field.required());
//! }
//! ```

mod document;
mod error;
mod input;
mod selector;

pub use document::{BlueprintDocument, BlueprintMetadata, AUTOMATION_DOMAIN};
pub use error::{BlueprintError, BlueprintResult};
pub use input::{read_input_schema, InputField};
pub use selector::{SelectorKind, SelectorTag};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
