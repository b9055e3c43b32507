//! Running the external checker with a time limit

use crate::command::{CheckerCommand, CONFIG_DIR_ENV};
use crate::outcome::{CheckerRun, RunStatus};
use crate::process_group::{self, GroupGuard};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long output may keep arriving after the checker exits
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Run `command` against the bundle at `config_dir`
///
/// Exactly one process is spawned, with stdin closed and stdout/stderr
/// captured. Expected process outcomes (non-zero exit, signal, timeout,
/// missing executable) are reported through [`RunStatus`], never as
/// errors. Dropping the returned future kills the checker's process group.
pub async fn invoke(command: &CheckerCommand, config_dir: &Path, timeout: Duration) -> CheckerRun {
    let start = Instant::now();
    let args = command.resolve_args(config_dir);
    let command_line = std::iter::once(command.program())
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = Command::new(command.program());
    cmd.args(&args)
        .env(CONFIG_DIR_ENV, config_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    process_group::isolate(&mut cmd);

    info!("Running checker: {}", command_line);
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Could not start checker {}: {}", command.program(), e);
            return CheckerRun {
                command: command_line,
                status: RunStatus::ToolUnavailable {
                    program: command.program().to_string(),
                    reason: e.to_string(),
                },
                stdout: String::new(),
                stderr: String::new(),
                duration: start.elapsed(),
            };
        }
    };
    let mut group = GroupGuard::new(child.id());

    // Readers run alongside the wait so a chatty checker cannot block on a
    // full pipe
    let stdout = tokio::spawn(read_all(child.stdout.take()));
    let stderr = tokio::spawn(read_all(child.stderr.take()));

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            debug!("Checker {}", status);
            RunStatus::Exited { code: status.code() }
        }
        Ok(Err(e)) => {
            warn!("Lost track of checker process: {}", e);
            RunStatus::ToolUnavailable {
                program: command.program().to_string(),
                reason: format!("failed to wait for process: {}", e),
            }
        }
        Err(_) => {
            warn!("Checker timed out after {:?}, killing it", timeout);
            group.kill();
            // Reaps the leader; also the only kill on non-unix targets
            if let Err(e) = child.kill().await {
                debug!("Checker already gone: {}", e);
            }
            RunStatus::TimedOut { after: timeout }
        }
    };
    // Leftovers in the group would hold the pipes open after the leader exits
    group.kill();

    let (stdout, stderr) = if matches!(status, RunStatus::TimedOut { .. }) {
        stdout.abort();
        stderr.abort();
        (String::new(), String::new())
    } else {
        tokio::join!(collect(stdout), collect(stderr))
    };

    let duration = start.elapsed();
    info!("Checker finished in {:.2}s: {}", duration.as_secs_f64(), status);
    CheckerRun {
        command: command_line,
        status,
        stdout,
        stderr,
        duration,
    }
}

/// Wait for a pipe reader once the checker has exited
///
/// A process that left the group can keep the pipe open indefinitely, so
/// the reader only gets [`DRAIN_GRACE`] before its output is dropped.
async fn collect(mut reader: JoinHandle<String>) -> String {
    match tokio::time::timeout(DRAIN_GRACE, &mut reader).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            debug!("Checker output reader failed: {}", e);
            String::new()
        }
        Err(_) => {
            warn!("Checker output still open {:?} after exit, dropping it", DRAIN_GRACE);
            reader.abort();
            String::new()
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("Checker output truncated: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> CheckerCommand {
        CheckerCommand::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    const LIMIT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_captures_streams_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let run = invoke(&sh("echo out; echo err >&2; exit 3"), dir.path(), LIMIT).await;

        assert_eq!(run.status, RunStatus::Exited { code: Some(3) });
        assert_eq!(run.stdout, "out\n");
        assert_eq!(run.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_bundle_path_is_passed_explicitly() {
        let dir = TempDir::new().unwrap();
        let command = CheckerCommand::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo \"$HA_VALIDATOR_CONFIG_DIR\"; echo \"$0\"".to_string(),
                "{config}".to_string(),
            ],
        );
        let run = invoke(&command, dir.path(), LIMIT).await;

        let expected = dir.path().display().to_string();
        let lines: Vec<&str> = run.stdout.lines().collect();
        assert_eq!(lines, vec![expected.as_str(), expected.as_str()]);
        assert!(run.command.contains(&expected));
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let dir = TempDir::new().unwrap();
        let run = invoke(&sh("cat; echo done"), dir.path(), LIMIT).await;
        assert_eq!(run.status, RunStatus::Exited { code: Some(0) });
        assert_eq!(run.stdout, "done\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_unavailable() {
        let dir = TempDir::new().unwrap();
        let command = CheckerCommand::parse("ha-validator-no-such-checker --config {config}").unwrap();
        let run = invoke(&command, dir.path(), LIMIT).await;

        match run.status {
            RunStatus::ToolUnavailable { program, .. } => {
                assert_eq!(program, "ha-validator-no-such-checker")
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signal_exit_has_no_code() {
        let dir = TempDir::new().unwrap();
        let run = invoke(&sh("kill -9 $$"), dir.path(), LIMIT).await;
        assert_eq!(run.status, RunStatus::Exited { code: None });
    }

    #[cfg(target_os = "linux")]
    fn alive(pid: i32) -> bool {
        // Zombies count as gone
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    async fn read_pid(path: &Path) -> i32 {
        for _ in 0..100 {
            if let Ok(text) = std::fs::read_to_string(path) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("pid file {:?} never written", path);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_and_reaps() {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());
        let limit = Duration::from_millis(500);

        let started = Instant::now();
        let run = invoke(&sh(&script), dir.path(), limit).await;
        let elapsed = started.elapsed();

        assert_eq!(run.status, RunStatus::TimedOut { after: limit });
        assert!(run.stdout.is_empty() && run.stderr.is_empty());
        assert!(elapsed < limit + Duration::from_secs(5), "took {:?}", elapsed);

        let pid = read_pid(&pid_file).await;
        assert!(!alive(pid), "checker {} still running", pid);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_exit_with_background_child_is_not_a_timeout() {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!(
            "sleep 20 & echo $! > {}; echo Configuration valid; exit 0",
            pid_file.display()
        );
        let limit = Duration::from_secs(3);

        let started = Instant::now();
        let run = invoke(&sh(&script), dir.path(), limit).await;
        let elapsed = started.elapsed();

        assert_eq!(run.status, RunStatus::Exited { code: Some(0) });
        assert_eq!(run.stdout, "Configuration valid\n");
        assert!(elapsed < limit, "took {:?}", elapsed);

        let pid = read_pid(&pid_file).await;
        let mut gone = false;
        for _ in 0..100 {
            if !alive(pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(gone, "background child {} outlived the checker", pid);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropping_invocation_kills_checker() {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());
        let command = sh(&script);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(500), invoke(&command, dir.path(), LIMIT))
                .await;
        assert!(cancelled.is_err());

        let pid = read_pid(&pid_file).await;
        let mut gone = false;
        for _ in 0..100 {
            if !alive(pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(gone, "checker {} survived cancellation", pid);
    }
}
