//! Checker runs and their classification

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// How the checker process ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// The process exited; `code` is `None` when a signal killed it
    Exited { code: Option<i32> },
    /// The time limit elapsed and the process group was killed
    TimedOut {
        #[serde(serialize_with = "as_secs")]
        after: Duration,
    },
    /// The process could not be started
    ToolUnavailable { program: String, reason: String },
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code: Some(code) } => write!(f, "exited with status {}", code),
            Self::Exited { code: None } => f.write_str("killed by a signal"),
            Self::TimedOut { after } => write!(f, "timed out after {:.1}s", after.as_secs_f64()),
            Self::ToolUnavailable { program, reason } => {
                write!(f, "could not start {}: {}", program, reason)
            }
        }
    }
}

/// Raw result of one checker invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerRun {
    /// The command line as executed
    pub command: String,
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CheckerRun {
    /// stdout followed by stderr
    pub fn combined_output(&self) -> String {
        let mut output = self.stdout.clone();
        if !output.is_empty() && !self.stderr.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&self.stderr);
        output
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A `(See <file>, line <n>)` reference, relative to the bundle root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => f.write_str(&self.file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// 1-based line of the checker output this came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            line: None,
            source: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Clean,
    PassWithWarnings,
    Failed,
    TimedOut,
    ToolUnavailable,
}

impl Classification {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Clean | Self::PassWithWarnings)
    }
}

/// Interpreted checker run; immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub status: RunStatus,
    /// Combined stdout and stderr
    pub output: String,
    pub classification: Classification,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
