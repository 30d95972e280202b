use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exprun::exec::{JobRun, JobRunner};
use exprun::ledger::{JobResult, RowHandle};
use exprun::types::Method;
use tokio_util::sync::CancellationToken;

/// Scripted answer of the fake solver for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeReply {
    /// Reports `solved = true` with this value.
    Solved(i64),
    /// Reports `solved = false`.
    Unsolved,
    /// Crash or unparseable output.
    Fail,
    /// Sleeps, then reports `Solved(value)`. Subject to timeout and cancel.
    Slow(Duration, i64),
}

/// One recorded dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
    pub index: usize,
    pub instance_key: String,
    pub method: Method,
    pub executable: String,
}

type Script = dyn Fn(&RowHandle) -> FakeReply + Send + Sync;

/// A fake runner that:
/// - records every dispatched row
/// - answers according to a script
/// - tracks how many jobs overlap in time
#[derive(Clone)]
pub struct FakeJobRunner {
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<FakeCall>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeJobRunner {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&RowHandle) -> FakeReply + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every row solves with `value`.
    pub fn always(value: i64) -> Self {
        Self::new(move |_| FakeReply::Solved(value))
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of jobs in flight at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl JobRunner for FakeJobRunner {
    fn run_job<'a>(
        &'a self,
        job: &'a RowHandle,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = JobRun> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(FakeCall {
                index: job.index,
                instance_key: job.instance_key.clone(),
                method: job.method,
                executable: job.executable.clone(),
            });
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let wall = Duration::from_micros(50);
            let run = match (self.script)(job) {
                FakeReply::Solved(v) => {
                    // Give other workers a chance to overlap.
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    JobRun::Finished(JobResult::success(true, v, 1_000, wall))
                }
                FakeReply::Unsolved => {
                    JobRun::Finished(JobResult::success(false, 0, 1_000, wall))
                }
                FakeReply::Fail => JobRun::Finished(JobResult::failure(wall)),
                FakeReply::Slow(delay, v) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay.min(timeout)) => {
                            if delay > timeout {
                                JobRun::Finished(JobResult::timeout(timeout))
                            } else {
                                JobRun::Finished(JobResult::success(true, v, 1_000, delay))
                            }
                        }
                        _ = cancel.cancelled() => JobRun::Cancelled,
                    }
                }
            };

            self.running.fetch_sub(1, Ordering::SeqCst);
            run
        })
    }
}
