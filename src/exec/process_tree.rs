// src/exec/process_tree.rs

//! Killing a job together with everything it spawned.
//!
//! On unix every job is its own process-group leader, so the whole tree can
//! be signalled at once. Elsewhere we can only reach the direct child.

use tokio::process::{Child, Command};
use tracing::debug;

/// Make the spawned process lead a new process group.
#[cfg(unix)]
pub fn isolate(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(not(unix))]
pub fn isolate(_cmd: &mut Command) {}

/// Send SIGKILL to the process group led by `pid`. Missing groups are fine.
#[cfg(unix)]
pub fn kill_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, error = %e, "failed to signal process group"),
    }
}

#[cfg(not(unix))]
pub fn kill_group(_pid: Option<u32>) {}

/// Kill the job's process tree and reap the direct child.
pub async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.kill().await {
        debug!(error = %e, "child already gone while killing");
    }
}
