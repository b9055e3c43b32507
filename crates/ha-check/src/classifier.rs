//! Turning checker output into a verdict
//!
//! `check_config` prints free-form text whose layout changes between Home
//! Assistant releases. Lines are matched against an ordered [`MarkerTable`];
//! the exit status decides the verdict and the markers only explain it.

use crate::outcome::{
    CheckOutcome, CheckerRun, Classification, Diagnostic, RunStatus, Severity, SourceLocation,
};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Built-in markers as `(name, pattern, severity)`, most specific first
const DEFAULT_MARKERS: &[(&str, &str, Severity)] = &[
    ("invalid_config", r"Invalid config for", Severity::Error),
    ("platform_error", r"Platform error", Severity::Error),
    ("integration_error", r"Integration error", Severity::Error),
    ("component_error", r"Component error", Severity::Error),
    ("error_loading", r"(?i)\berror loading\b", Severity::Error),
    ("blueprint_load", r"(?i)failed to load blueprint", Severity::Error),
    ("missing_input", r"(?i)\bmissing input\b", Severity::Error),
    (
        "not_found",
        r"(?i)\bunable to find\b|\b(?:integration|entity|component|platform|service)\b.*\bnot found\b",
        Severity::Error,
    ),
    ("error_prefix", r"^\s*(?:-\s+)?Error:", Severity::Error),
    ("log_error", r"\b(?:ERROR|CRITICAL)\b", Severity::Error),
    ("warning_prefix", r"^\s*(?:-\s+)?Warning:", Severity::Warning),
    ("log_warning", r"\bWARNING\b", Severity::Warning),
    ("deprecated", r"(?i)\bdeprecated\b", Severity::Warning),
];

/// One line classifier
#[derive(Debug, Clone)]
pub struct MarkerRule {
    pub name: String,
    pub pattern: Regex,
    pub severity: Severity,
}

impl MarkerRule {
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        severity: Severity,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            severity,
        })
    }
}

/// Ordered marker rules; the first match classifies a line
#[derive(Debug, Clone)]
pub struct MarkerTable {
    rules: Vec<MarkerRule>,
}

impl MarkerTable {
    pub fn new(rules: Vec<MarkerRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[MarkerRule] {
        &self.rules
    }

    /// First rule matching `line`
    pub fn match_line(&self, line: &str) -> Option<&MarkerRule> {
        self.rules.iter().find(|rule| rule.pattern.is_match(line))
    }

    /// Classify a finished checker run
    ///
    /// The exit status is authoritative: a zero exit passes even when
    /// error markers appear, and those markers are reported as warnings.
    pub fn classify(&self, run: &CheckerRun, bundle_root: &Path) -> CheckOutcome {
        let output = run.combined_output();

        let (classification, diagnostics) = match &run.status {
            RunStatus::TimedOut { after } => (
                Classification::TimedOut,
                vec![Diagnostic::error(format!(
                    "Checker did not finish within {:.1}s and was killed",
                    after.as_secs_f64()
                ))],
            ),
            RunStatus::ToolUnavailable { program, reason } => (
                Classification::ToolUnavailable,
                vec![Diagnostic::error(format!(
                    "Checker '{}' could not be run: {}",
                    program, reason
                ))],
            ),
            RunStatus::Exited { code: Some(0) } => {
                let mut diagnostics = self.scan(&output, bundle_root);
                if diagnostics.is_empty() {
                    (Classification::Clean, diagnostics)
                } else {
                    for diagnostic in &mut diagnostics {
                        diagnostic.severity = Severity::Warning;
                    }
                    (Classification::PassWithWarnings, diagnostics)
                }
            }
            RunStatus::Exited { .. } => {
                let mut diagnostics = self.scan(&output, bundle_root);
                if !diagnostics.iter().any(|d| d.severity == Severity::Error) {
                    diagnostics.push(fallback(&run.status, &output));
                }
                (Classification::Failed, diagnostics)
            }
        };

        debug!(
            "Classified checker run as {:?} with {} diagnostics",
            classification,
            diagnostics.len()
        );
        CheckOutcome {
            status: run.status.clone(),
            output,
            classification,
            diagnostics,
        }
    }

    fn scan(&self, output: &str, bundle_root: &Path) -> Vec<Diagnostic> {
        output
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| {
                let rule = self.match_line(line)?;
                debug!("Output line {} matched marker {}", index + 1, rule.name);
                Some(Diagnostic {
                    severity: rule.severity,
                    message: clean_message(line, bundle_root),
                    line: Some(index + 1),
                    source: source_location(line, bundle_root),
                })
            })
            .collect()
    }
}

impl Default for MarkerTable {
    fn default() -> Self {
        let rules = DEFAULT_MARKERS
            .iter()
            .filter_map(
                |(name, pattern, severity)| match MarkerRule::new(*name, pattern, *severity) {
                    Ok(rule) => Some(rule),
                    Err(e) => {
                        warn!("Skipping marker {}: {}", name, e);
                        None
                    }
                },
            )
            .collect();
        Self::new(rules)
    }
}

/// Classify with the built-in marker table
pub fn classify(run: &CheckerRun, bundle_root: &Path) -> CheckOutcome {
    MarkerTable::default().classify(run, bundle_root)
}

fn fallback(status: &RunStatus, output: &str) -> Diagnostic {
    let output = output.trim_end();
    if output.trim().is_empty() {
        Diagnostic::error(format!("Checker {} and printed nothing", status))
    } else {
        Diagnostic::error(format!(
            "Checker {} without a recognized error; full output:\n{}",
            status, output
        ))
    }
}

fn see_pattern() -> Option<&'static Regex> {
    static SEE: OnceLock<Option<Regex>> = OnceLock::new();
    SEE.get_or_init(|| Regex::new(r"\(See ([^,()]+?)(?:, line (\d+))?\)").ok())
        .as_ref()
}

fn at_pattern() -> Option<&'static Regex> {
    static AT: OnceLock<Option<Regex>> = OnceLock::new();
    AT.get_or_init(|| Regex::new(r"\bat (\S+?\.ya?ml), line (\d+)").ok())
        .as_ref()
}

/// Trimmed line without its list bullet, `(See ...)` suffix or bundle root
fn clean_message(line: &str, bundle_root: &Path) -> String {
    let mut message = line.trim();
    message = message.strip_prefix("- ").unwrap_or(message).trim_start();

    let mut message = match see_pattern() {
        Some(see) => see.replace_all(message, "").trim_end().to_string(),
        None => message.to_string(),
    };
    let prefix = format!("{}/", bundle_root.display());
    if !bundle_root.as_os_str().is_empty() {
        message = message.replace(&prefix, "");
    }
    message
}

fn source_location(line: &str, bundle_root: &Path) -> Option<SourceLocation> {
    let captures = see_pattern()
        .and_then(|see| see.captures(line))
        .or_else(|| at_pattern().and_then(|at| at.captures(line)))?;
    let file = captures.get(1)?.as_str().trim();
    let line = captures.get(2).and_then(|n| n.as_str().parse().ok());

    let file = Path::new(file)
        .strip_prefix(bundle_root)
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|_| file.to_string());

    Some(SourceLocation { file, line })
}
