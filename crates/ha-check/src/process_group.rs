//! Process-group containment for the checker
//!
//! The checker runs as the leader of its own process group, so everything
//! it forks can be killed together. On non-unix targets only the direct
//! child is tracked, through `kill_on_drop`.

use tokio::process::Command;
use tracing::debug;

/// Make the spawned process lead a new process group
pub(crate) fn isolate(command: &mut Command) {
    #[cfg(unix)]
    command.process_group(0);
    #[cfg(not(unix))]
    let _ = command;
}

/// Kills the checker's process group at the latest when dropped
#[derive(Debug)]
pub(crate) struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    /// Guard the group led by `pid`
    pub(crate) fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    /// Send SIGKILL to the whole group; later calls are no-ops
    pub(crate) fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = i32::try_from(pgid) else {
        return;
    };
    // SAFETY: a negative pid addresses the process group we created.
    let ret = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if ret == 0 {
        debug!(pgid, "killed checker process group");
    } else {
        debug!(pgid, "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(pgid: u32) {
    debug!(pgid, "process groups unsupported; relying on kill_on_drop");
}
