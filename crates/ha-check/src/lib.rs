//! External checker invocation and output classification
//!
//! [`invoke`] runs the checker against a bundle under a time limit and
//! returns a raw [`CheckerRun`]; [`classify`] interprets that run into a
//! [`CheckOutcome`] with diagnostics.
//!
//! ```ignore
//! use ha_check::{classify, invoke, CheckerCommand};
//!
//! let run = invoke(&CheckerCommand::default(), bundle.root(), timeout).await;
//! let outcome = classify(&run, bundle.root());
//! ```

mod classifier;
mod command;
mod invoker;
mod outcome;
mod process_group;

pub use classifier::{classify, MarkerRule, MarkerTable};
pub use command::{
    CheckerCommand, CommandError, CONFIG_DIR_ENV, CONFIG_PLACEHOLDER, DEFAULT_CHECKER,
};
pub use invoker::invoke;
pub use outcome::{
    CheckOutcome, CheckerRun, Classification, Diagnostic, RunStatus, Severity, SourceLocation,
};
