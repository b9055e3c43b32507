//! Harness configuration

use ha_blueprint::Value;
use ha_bundle::{BundleRootGenerator, RootSeed};
use ha_check::CheckerCommand;
use ha_fixtures::InputOverrides;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Checker command line, `{config}` marks the bundle path
pub const CHECKER_ENV: &str = "HA_VALIDATOR_CHECKER";
/// Checker time limit in whole seconds
pub const TIMEOUT_ENV: &str = "HA_VALIDATOR_TIMEOUT";
/// Parent directory for bundle roots
pub const BUNDLE_DIR_ENV: &str = "HA_VALIDATOR_BUNDLE_DIR";

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for one or more harness runs
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// External checker to run against the bundle
    pub checker: CheckerCommand,
    /// Limit on the checker's wall-clock time
    pub timeout: Duration,
    /// Directory bundle roots are created in
    pub bundle_parent: PathBuf,
    /// Bundle root seed; a fresh ULID per run when unset
    pub seed: Option<RootSeed>,
    /// Invoke the checker; otherwise stop once the bundle is assembled
    pub run_check_config: bool,
    /// Leave the bundle on disk after the run
    pub keep_bundle: bool,
    /// Caller-supplied input values
    pub overrides: InputOverrides,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// Unset variables take their defaults; unusable values are logged and
    /// also fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let checker = lookup(CHECKER_ENV)
            .and_then(|line| match CheckerCommand::parse(&line) {
                Ok(command) => Some(command),
                Err(e) => {
                    warn!("Ignoring {}: {}", CHECKER_ENV, e);
                    None
                }
            })
            .unwrap_or_default();

        let timeout_secs = lookup(TIMEOUT_ENV)
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    warn!(
                        "Ignoring {}={:?}, expected a positive number of seconds",
                        TIMEOUT_ENV, raw
                    );
                    None
                }
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let bundle_parent = lookup(BUNDLE_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        Self {
            checker,
            timeout: Duration::from_secs(timeout_secs),
            bundle_parent,
            seed: None,
            run_check_config: false,
            keep_bundle: false,
            overrides: InputOverrides::new(),
        }
    }

    /// Root generator for `bundle_parent`
    pub fn roots(&self) -> BundleRootGenerator {
        BundleRootGenerator::new(&self.bundle_parent)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read input values from {path}: {source}")]
    ReadInputs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse input values in {path}: {source}")]
    ParseInputs {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("input values in {path} must be a mapping of input name to value")]
    NotAMapping { path: PathBuf },
}

/// Read a YAML mapping of input name to value
///
/// An empty file yields no overrides.
pub fn read_overrides(path: &Path) -> Result<InputOverrides, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadInputs {
        path: path.to_path_buf(),
        source: e,
    })?;
    if raw.trim().is_empty() {
        return Ok(InputOverrides::new());
    }
    let value: Value = serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseInputs {
        path: path.to_path_buf(),
        source: e,
    })?;

    match value {
        Value::Null => Ok(InputOverrides::new()),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .map(|(key, value)| match key {
                Value::String(name) => Ok((name, value)),
                _ => Err(ConfigError::NotAMapping {
                    path: path.to_path_buf(),
                }),
            })
            .collect(),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn config(vars: &[(&str, &str)]) -> HarnessConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HarnessConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.checker, CheckerCommand::default());
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.bundle_parent, env::temp_dir());
        assert!(!config.run_check_config);
        assert!(!config.keep_bundle);
    }

    #[test]
    fn test_environment_values() {
        let config = config(&[
            (CHECKER_ENV, "my-checker {config}"),
            (TIMEOUT_ENV, "15"),
            (BUNDLE_DIR_ENV, "/var/tmp/bundles"),
        ]);
        assert_eq!(config.checker.program(), "my-checker");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.roots().parent(), Path::new("/var/tmp/bundles"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        for timeout in ["0", "-3", "soon"] {
            let config = config(&[(TIMEOUT_ENV, timeout), (CHECKER_ENV, "   ")]);
            assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
            assert_eq!(config.checker, CheckerCommand::default());
        }
    }

    #[test]
    fn test_read_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inputs.yaml");
        std::fs::write(&path, "start_time: '22:00:00'\nlights:\n  entity_id: light.den\n").unwrap();

        let overrides = read_overrides(&path).unwrap();
        assert_eq!(
            overrides.keys().collect::<Vec<_>>(),
            vec!["start_time", "lights"]
        );
        assert_eq!(
            overrides["start_time"],
            Value::String("22:00:00".to_string())
        );
    }

    #[test]
    fn test_read_overrides_rejects_non_mappings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inputs.yaml");

        std::fs::write(&path, "").unwrap();
        assert!(read_overrides(&path).unwrap().is_empty());

        std::fs::write(&path, "- a\n- b\n").unwrap();
        assert!(matches!(
            read_overrides(&path),
            Err(ConfigError::NotAMapping { .. })
        ));

        assert!(matches!(
            read_overrides(&dir.path().join("missing.yaml")),
            Err(ConfigError::ReadInputs { .. })
        ));
    }
}
