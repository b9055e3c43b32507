//! Home Assistant blueprint validation harness
//!
//! Builds a throwaway configuration around one automation blueprint, runs
//! `hass --script check_config` against it and reports a verdict.
//!
//! # Architecture
//!
//! ```text
//! blueprint.yaml
//!      │  ha-blueprint   read metadata and input schema
//!      ▼
//!  InputField*
//!      │  ha-fixtures    assign values, mint fixture entities
//!      ▼
//!  InputAssignment + FixtureSet
//!      │  ha-bundle      write configuration.yaml + blueprint copy
//!      ▼
//!  ConfigBundle
//!      │  ha-check       run the checker, classify its output
//!      ▼
//!  RunReport (Verdict, diagnostics)
//! ```

pub mod config;
pub mod harness;
pub mod report;

pub use config::{read_overrides, ConfigError, HarnessConfig};
pub use harness::{Harness, HarnessError};
pub use report::{CheckerSummary, RunReport, Verdict, INTERRUPTED_EXIT_CODE};
