//! Checker command lines

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Replaced by the bundle path in any checker argument
pub const CONFIG_PLACEHOLDER: &str = "{config}";

/// Environment variable carrying the bundle path to the checker
pub const CONFIG_DIR_ENV: &str = "HA_VALIDATOR_CONFIG_DIR";

/// `hass --script check_config --config {config}`
pub const DEFAULT_CHECKER: &str = "hass --script check_config --config {config}";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Checker command is empty")]
    Empty,
}

/// Program plus arguments of the external checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckerCommand {
    program: String,
    args: Vec<String>,
}

impl CheckerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line
    ///
    /// No shell quoting is interpreted; wrap the checker in a script if an
    /// argument needs embedded spaces.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(CommandError::Empty)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments with every `{config}` replaced by `config_dir`
    pub fn resolve_args(&self, config_dir: &Path) -> Vec<String> {
        let dir = config_dir.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(CONFIG_PLACEHOLDER, &dir))
            .collect()
    }
}

impl Default for CheckerCommand {
    fn default() -> Self {
        Self::new(
            "hass",
            ["--script", "check_config", "--config", CONFIG_PLACEHOLDER]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl FromStr for CheckerCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CheckerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
