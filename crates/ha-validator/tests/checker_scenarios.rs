//! End-to-end harness runs against stand-in checkers
#![cfg(unix)]

use ha_check::{CheckerCommand, RunStatus, Severity};
use ha_fixtures::ValueOrigin;
use ha_validator::{Harness, HarnessConfig, Verdict};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// `sh -c <script> <bundle path>`, so the script sees the bundle as `$0`
fn sh(script: &str) -> CheckerCommand {
    CheckerCommand::new(
        "sh",
        vec![
            "-c".to_string(),
            script.to_string(),
            "{config}".to_string(),
        ],
    )
}

fn checking(parent: &TempDir, checker: CheckerCommand) -> HarnessConfig {
    let mut config = HarnessConfig::from_lookup(|_| None);
    config.bundle_parent = parent.path().to_path_buf();
    config.run_check_config = true;
    config.checker = checker;
    config.timeout = Duration::from_secs(30);
    config
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_clean_blueprint() {
    let parent = TempDir::new().unwrap();
    let checker = sh(r#"test -f "$0/configuration.yaml" \
        && test -f "$HA_VALIDATOR_CONFIG_DIR/blueprints/automation/harness/movie_mode.yaml" \
        && echo "Testing configuration at $0" \
        && echo "Configuration valid""#);

    let report = Harness::new(checking(&parent, checker))
        .run(fixture("movie_mode.yaml"))
        .await;

    assert_eq!(report.verdict, Verdict::Clean, "{}", report.render_text());
    assert_eq!(report.exit_code, 0);
    assert!(report.diagnostics.is_empty());

    let checker = report.checker.unwrap();
    assert_eq!(checker.status, RunStatus::Exited { code: Some(0) });
    assert!(checker.output.contains("Configuration valid"));
    assert_eq!(entries(parent.path()), 0);
}

#[tokio::test]
async fn test_clean_with_defaulted_player_and_helper() {
    let parent = TempDir::new().unwrap();
    let checker = sh(r#"grep -q living_room_tv "$0/configuration.yaml" \
        && grep -q movie_night "$0/configuration.yaml" \
        && echo "Configuration valid""#);

    let report = Harness::new(checking(&parent, checker))
        .run(fixture("tv_helper_defaults.yaml"))
        .await;

    assert_eq!(report.verdict, Verdict::Clean, "{}", report.render_text());
    assert_eq!(report.exit_code, 0);
    assert!(report.diagnostics.is_empty());

    let inputs = report.inputs.as_ref().unwrap();
    assert_eq!(inputs.len(), 2);
    assert!(inputs.iter().all(|(_, input)| input.origin == ValueOrigin::Default));
    assert_eq!(entries(parent.path()), 0);
}

#[tokio::test]
async fn test_cancelled_run_removes_bundle() {
    let parent = TempDir::new().unwrap();
    let harness = Harness::new(checking(&parent, sh("exec sleep 30")));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(700),
        harness.run(fixture("movie_mode.yaml")),
    )
    .await;

    assert!(cancelled.is_err());
    assert_eq!(entries(parent.path()), 0);
}

#[tokio::test]
async fn test_failed_with_one_error() {
    let parent = TempDir::new().unwrap();
    let checker = sh(r#"echo "Testing configuration at $0"
echo "Failed config"
echo "  automation:"
echo "    - Invalid config for 'automation': required key not provided @ data['triggers']. (See $0/configuration.yaml, line 41)"
exit 1"#);

    let report = Harness::new(checking(&parent, checker))
        .run(fixture("movie_mode.yaml"))
        .await;

    assert_eq!(report.verdict, Verdict::Failed);
    assert_ne!(report.exit_code, 0);
    assert_eq!(report.diagnostics.len(), 1);

    let error = &report.diagnostics[0];
    assert_eq!(error.severity, Severity::Error);
    assert!(error.message.starts_with("Invalid config for 'automation'"));
    let source = error.source.as_ref().unwrap();
    assert_eq!(source.file, "configuration.yaml");
    assert_eq!(source.line, Some(41));
}

#[tokio::test]
async fn test_warnings_on_success() {
    let parent = TempDir::new().unwrap();
    let checker = sh(r#"echo "2026-01-01 12:00:00.000 WARNING (MainThread) [homeassistant.helpers] slow setup"
exit 0"#);

    let report = Harness::new(checking(&parent, checker))
        .run(fixture("all_defaults.yaml"))
        .await;

    assert_eq!(report.verdict, Verdict::PassWithWarnings);
    assert_eq!(report.exit_code, 0);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_missing_tool_is_distinct_from_failure() {
    let parent = TempDir::new().unwrap();
    let checker = CheckerCommand::parse("ha-validator-missing-hass --script check_config --config {config}")
        .unwrap();

    let report = Harness::new(checking(&parent, checker))
        .run(fixture("movie_mode.yaml"))
        .await;

    assert_eq!(report.verdict, Verdict::ToolUnavailable);
    assert_ne!(report.exit_code, Verdict::Failed.exit_code());
    assert_ne!(report.exit_code, 0);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0]
        .message
        .contains("ha-validator-missing-hass"));
    assert_eq!(entries(parent.path()), 0);
}

#[tokio::test]
async fn test_timeout_is_enforced() {
    let parent = TempDir::new().unwrap();
    let mut config = checking(&parent, sh("echo started; exec sleep 30"));
    config.timeout = Duration::from_secs(1);

    let started = Instant::now();
    let report = Harness::new(config).run(fixture("movie_mode.yaml")).await;
    let elapsed = started.elapsed();

    assert_eq!(report.verdict, Verdict::TimedOut);
    assert_eq!(report.exit_code, 7);
    assert!(elapsed < Duration::from_secs(6), "took {:?}", elapsed);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        report.checker.unwrap().status,
        RunStatus::TimedOut { .. }
    ));
    assert_eq!(entries(parent.path()), 0);
}

#[tokio::test]
async fn test_retained_bundle_after_failure() {
    let parent = TempDir::new().unwrap();
    let mut config = checking(&parent, sh("echo 'Error: something broke'; exit 2"));
    config.keep_bundle = true;

    let report = Harness::new(config).run(fixture("movie_mode.yaml")).await;

    assert_eq!(report.verdict, Verdict::Failed);
    let bundle = report.bundle.clone().unwrap();
    assert!(bundle.join("configuration.yaml").exists());

    let text = report.render_text();
    assert!(text.contains("Verdict: failed (exit 1)"));
    assert!(text.contains("error: Error: something broke"));
    assert!(text.contains(&format!("Bundle retained at: {}", bundle.display())));
}
