//! Fixture synthesis for blueprint validation
//!
//! Turns a blueprint's declared inputs into concrete values and the minimal
//! set of stand-in entities those values reference: media players, boolean
//! helpers, scenes, a notification target placeholder, and whatever else an
//! entity selector asks for.

mod assignment;
mod entity_id;
mod error;
mod fixture;
mod rules;

pub use assignment::{
    entity_references, synthesize, AssignedInput, InputAssignment, InputOverrides, Synthesis,
    ValueOrigin,
};
pub use entity_id::{friendly_name, slugify, EntityId, EntityIdError};
pub use error::{SynthesisError, SynthesisResult};
pub use fixture::{FixtureEntity, FixtureKind, FixtureSet};
pub use rules::{
    has_rule, DEFAULT_ENTITY_DOMAIN, DEFAULT_TARGET_DOMAIN, TEXT_SENTINEL, TIME_SENTINEL,
};
