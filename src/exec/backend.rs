// src/exec/backend.rs

//! Pluggable job runner abstraction.
//!
//! Workers talk to a `JobRunner` instead of spawning processes themselves.
//! Production code uses [`ProcessJobRunner`](super::ProcessJobRunner); tests
//! can provide their own implementation that doesn't spawn real processes.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ledger::{JobResult, RowHandle};

/// How a single dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRun {
    /// The job reached a terminal outcome that belongs in the ledger.
    Finished(JobResult),
    /// The run was shut down while the job was in flight; nothing to record.
    Cancelled,
}

/// Trait abstracting how one claimed row is executed.
pub trait JobRunner: Send + Sync {
    /// Run `job` to a terminal outcome.
    ///
    /// Implementations must:
    /// - never return a job-level problem as a panic; every failure becomes
    ///   a `JobRun::Finished` with the matching outcome
    /// - stop the job no later than `timeout` after it started
    /// - stop the job promptly and return `JobRun::Cancelled` once `cancel`
    ///   fires
    fn run_job<'a>(
        &'a self,
        job: &'a RowHandle,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = JobRun> + Send + 'a>>;
}
