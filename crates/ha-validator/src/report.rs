//! Run verdicts and reports

use chrono::{DateTime, Utc};
use ha_check::{Classification, Diagnostic, RunStatus};
use ha_fixtures::InputAssignment;
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Exit status when the run was interrupted
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Overall result of a run; each failure category stays distinct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    PassWithWarnings,
    /// Bundle assembled, checker not requested
    Prepared,
    Failed,
    TimedOut,
    ToolUnavailable,
    MalformedBlueprint,
    UnsupportedSelector,
    BundleAssembly,
}

impl Verdict {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Clean | Self::PassWithWarnings | Self::Prepared => 0,
            Self::Failed => 1,
            Self::MalformedBlueprint => 3,
            Self::UnsupportedSelector => 4,
            Self::BundleAssembly => 5,
            Self::ToolUnavailable => 6,
            Self::TimedOut => 7,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code() == 0
    }
}

impl From<Classification> for Verdict {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Clean => Self::Clean,
            Classification::PassWithWarnings => Self::PassWithWarnings,
            Classification::Failed => Self::Failed,
            Classification::TimedOut => Self::TimedOut,
            Classification::ToolUnavailable => Self::ToolUnavailable,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clean => "clean",
            Self::PassWithWarnings => "passed with warnings",
            Self::Prepared => "prepared",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::ToolUnavailable => "checker unavailable",
            Self::MalformedBlueprint => "malformed blueprint",
            Self::UnsupportedSelector => "unsupported selector",
            Self::BundleAssembly => "bundle assembly error",
        })
    }
}

/// What the checker did, when it was run
#[derive(Debug, Clone, Serialize)]
pub struct CheckerSummary {
    pub command: String,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub output: String,
}

/// Everything known about one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub blueprint: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint_name: Option<String>,
    pub verdict: Verdict,
    pub exit_code: u8,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputAssignment>,
    pub fixture_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker: Option<CheckerSummary>,
    /// Set only when the bundle was retained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<PathBuf>,
}

impl RunReport {
    pub(crate) fn new(blueprint: PathBuf, started_at: DateTime<Utc>) -> Self {
        Self {
            blueprint,
            blueprint_name: None,
            verdict: Verdict::Prepared,
            exit_code: Verdict::Prepared.exit_code(),
            started_at,
            duration_ms: 0,
            diagnostics: Vec::new(),
            inputs: None,
            fixture_count: 0,
            checker: None,
            bundle: None,
        }
    }

    pub(crate) fn set_verdict(&mut self, verdict: Verdict) {
        self.verdict = verdict;
        self.exit_code = verdict.exit_code();
    }

    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let name = self
            .blueprint_name
            .as_deref()
            .map(|name| format!("{} ({})", name, self.blueprint.display()))
            .unwrap_or_else(|| self.blueprint.display().to_string());
        let _ = writeln!(out, "Blueprint: {}", name);
        let _ = writeln!(out, "Verdict: {} (exit {})", self.verdict, self.exit_code);

        if let Some(checker) = &self.checker {
            let _ = writeln!(
                out,
                "Checker: {} ({}, {} ms)",
                checker.command, checker.status, checker.duration_ms
            );
        }

        for diagnostic in &self.diagnostics {
            let mut lines = diagnostic.to_string();
            if let Some(line) = diagnostic.line {
                lines.push_str(&format!(" [output line {}]", line));
            }
            for (i, line) in lines.lines().enumerate() {
                let indent = if i == 0 { "  " } else { "    " };
                let _ = writeln!(out, "{}{}", indent, line);
            }
        }

        if let Some(bundle) = &self.bundle {
            let _ = writeln!(out, "Bundle retained at: {}", bundle.display());
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
