// src/engine/pool.rs

//! Fixed-size pool of workers draining the ledger.
//!
//! Each worker loops: claim a row, run it, record the result. Workers share
//! nothing but the ledger. The pool size is the only limit on how many
//! solver processes run at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::errors::{ExprunError, Result};
use crate::exec::{JobRun, JobRunner};
use crate::ledger::Ledger;
use crate::types::Outcome;

/// What one worker did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub success: usize,
    pub failure: usize,
    pub timeout: usize,
    pub cancelled: usize,
}

impl WorkerStats {
    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::Failure => self.failure += 1,
            Outcome::Timeout => self.timeout += 1,
            Outcome::Unset => {}
        }
    }

    fn merge(&mut self, other: WorkerStats) {
        self.success += other.success;
        self.failure += other.failure;
        self.timeout += other.timeout;
        self.cancelled += other.cancelled;
    }

    pub fn completed(&self) -> usize {
        self.success + self.failure + self.timeout
    }
}

pub struct WorkerPool<R: JobRunner + 'static> {
    ledger: Arc<Ledger>,
    runner: Arc<R>,
    size: usize,
    timeout: Duration,
}

impl<R: JobRunner + 'static> WorkerPool<R> {
    pub fn new(ledger: Arc<Ledger>, runner: Arc<R>, size: usize, timeout: Duration) -> Self {
        Self {
            ledger,
            runner,
            size: size.max(1),
            timeout,
        }
    }

    /// Run all workers until the ledger is exhausted or `cancel` fires.
    ///
    /// A ledger error in any worker cancels the others and is returned once
    /// every worker has stopped.
    pub async fn run(&self, cancel: CancellationToken) -> Result<WorkerStats> {
        info!(workers = self.size, timeout_secs = self.timeout.as_secs_f64(), "starting worker pool");

        let mut workers = JoinSet::new();
        for id in 0..self.size {
            workers.spawn(worker_loop(
                id,
                Arc::clone(&self.ledger),
                Arc::clone(&self.runner),
                self.timeout,
                cancel.clone(),
            ));
        }

        let mut totals = WorkerStats::default();
        let mut first_error: Option<ExprunError> = None;

        while let Some(joined) = workers.join_next().await {
            let outcome = joined
                .map_err(|e| ExprunError::Other(anyhow::anyhow!("worker task failed: {e}")))
                .and_then(|r| r);
            match outcome {
                Ok(stats) => totals.merge(stats),
                Err(e) => {
                    error!(error = %e, "worker stopped on a fatal error; cancelling the run");
                    cancel.cancel();
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(completed = totals.completed(), "worker pool finished");
                Ok(totals)
            }
        }
    }
}

async fn worker_loop<R: JobRunner>(
    id: usize,
    ledger: Arc<Ledger>,
    runner: Arc<R>,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<WorkerStats> {
    let mut stats = WorkerStats::default();

    while !cancel.is_cancelled() {
        let Some(row) = ledger.claim_next().await else {
            debug!(worker = id, "no pending rows left");
            break;
        };

        match runner.run_job(&row, timeout, cancel.child_token()).await {
            JobRun::Finished(result) => {
                ledger.record_result(row.index, &result).await?;
                stats.count(result.outcome);
            }
            JobRun::Cancelled => {
                ledger.release(row.index).await;
                stats.cancelled += 1;
                break;
            }
        }
    }

    debug!(worker = id, ?stats, "worker finished");
    Ok(stats)
}
