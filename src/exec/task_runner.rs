// src/exec/task_runner.rs

//! Runs one claimed row as a solver subprocess.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::exec::backend::{JobRun, JobRunner};
use crate::exec::process_tree;
use crate::exec::protocol::parse_report;
use crate::ledger::{JobResult, RowHandle};

/// Maximum stdout or stderr size captured per stream (1 MiB).
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Job runner that invokes `<executable> "<instance>" -m <method>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessJobRunner;

impl ProcessJobRunner {
    pub fn new() -> Self {
        Self
    }
}

impl JobRunner for ProcessJobRunner {
    fn run_job<'a>(
        &'a self,
        job: &'a RowHandle,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = JobRun> + Send + 'a>> {
        Box::pin(run_process(job, timeout, cancel))
    }
}

/// Build the solver command line. The executable string may carry leading
/// arguments of its own (`"bin/solver --threads 1"`).
pub fn build_command(job: &RowHandle) -> Option<Command> {
    let mut parts = job.executable.split_whitespace();
    let program = parts.next()?;

    let mut cmd = Command::new(program);
    cmd.args(parts)
        .arg(&job.instance)
        .arg("-m")
        .arg(job.method.as_str());
    Some(cmd)
}

/// Run a single solver process to a terminal outcome.
///
/// - exit 0 with a well-formed report -> `success`
/// - non-zero exit, spawn error or malformed report -> `failure`
/// - still running after `timeout` -> process tree killed, `timeout`
/// - `cancel` fired -> process tree killed, `JobRun::Cancelled`
pub async fn run_process(job: &RowHandle, timeout: Duration, cancel: CancellationToken) -> JobRun {
    let start = Instant::now();

    let Some(mut cmd) = build_command(job) else {
        warn!(row = job.index, "empty executable name; recording failure");
        return JobRun::Finished(JobResult::failure(start.elapsed()));
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    process_tree::isolate(&mut cmd);

    info!(
        row = job.index,
        method = %job.method,
        executable = %job.executable,
        instance_key = %job.instance_key,
        "starting solver"
    );

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(
                row = job.index,
                executable = %job.executable,
                error = %e,
                "failed to spawn solver"
            );
            return JobRun::Finished(JobResult::failure(start.elapsed()));
        }
    };
    let pid = child.id();

    // Read both pipes concurrently so a chatty solver can't block on a full
    // buffer while we wait for it.
    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    tokio::select! {
        status = child.wait() => {
            let wall = start.elapsed();
            // Anything the solver left behind would hold the pipes open.
            process_tree::kill_group(pid);
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            JobRun::Finished(classify(job, status, &stdout, &stderr, wall))
        }

        _ = tokio::time::sleep(timeout) => {
            process_tree::terminate(&mut child, pid).await;
            stdout_task.abort();
            stderr_task.abort();
            warn!(
                row = job.index,
                method = %job.method,
                instance_key = %job.instance_key,
                timeout_secs = timeout.as_secs_f64(),
                "solver timed out; process killed"
            );
            JobRun::Finished(JobResult::timeout(timeout))
        }

        _ = cancel.cancelled() => {
            process_tree::terminate(&mut child, pid).await;
            stdout_task.abort();
            stderr_task.abort();
            info!(row = job.index, "run cancelled; solver killed");
            JobRun::Cancelled
        }
    }
}

fn classify(
    job: &RowHandle,
    status: std::io::Result<ExitStatus>,
    stdout: &[u8],
    stderr: &[u8],
    wall: Duration,
) -> JobResult {
    let status = match status {
        Ok(status) => status,
        Err(e) => {
            warn!(row = job.index, error = %e, "waiting for solver failed");
            return JobResult::failure(wall);
        }
    };

    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        debug!(row = job.index, "stderr: {}", stderr.trim());
    }

    if !status.success() {
        warn!(
            row = job.index,
            method = %job.method,
            executable = %job.executable,
            instance_key = %job.instance_key,
            exit_code = ?status.code(),
            stderr = %stderr.trim(),
            "solver failed"
        );
        return JobResult::failure(wall);
    }

    let stdout = String::from_utf8_lossy(stdout);
    match parse_report(&stdout) {
        Ok(report) => {
            info!(
                row = job.index,
                method = %job.method,
                instance_key = %job.instance_key,
                solved = report.solved,
                value = report.value,
                "solver completed"
            );
            JobResult::success(report.solved, report.value, report.elapsed_ns, wall)
        }
        Err(e) => {
            warn!(
                row = job.index,
                method = %job.method,
                executable = %job.executable,
                error = %e,
                stdout = %stdout.trim(),
                "solver output violates the report format"
            );
            JobResult::failure(wall)
        }
    }
}

/// Read an entire output stream, keeping at most [`MAX_OUTPUT_BYTES`].
///
/// The rest is drained and discarded: closing the pipe early would kill a
/// chatty solver with SIGPIPE.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}
