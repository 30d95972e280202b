// src/engine/orchestrator.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::RunConfig;
use crate::errors::{ExprunError, Result};
use crate::exec::JobRunner;
use crate::fs::{FileSystem, RealFileSystem};
use crate::instance::{load_instances, Graph6Keyer, InstanceKeyer};
use crate::ledger::{build_units, check_unique, Ledger, LedgerStore, LedgerSummary};

use super::pool::{WorkerPool, WorkerStats};

/// Result of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// State of the whole ledger after the run.
    pub ledger: LedgerSummary,
    /// What this invocation itself completed.
    pub this_run: WorkerStats,
    /// True if the run was cancelled before the ledger was exhausted.
    pub interrupted: bool,
}

/// Wires config, ledger, runner and worker pool together for one run.
pub struct Orchestrator<R: JobRunner + 'static> {
    config: RunConfig,
    runner: Arc<R>,
    fs: Arc<dyn FileSystem>,
    keyer: Arc<dyn InstanceKeyer>,
}

impl<R: JobRunner + 'static> Orchestrator<R> {
    pub fn new(config: RunConfig, runner: R) -> Self {
        Self {
            config,
            runner: Arc::new(runner),
            fs: Arc::new(RealFileSystem),
            keyer: Arc::new(Graph6Keyer),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_keyer(mut self, keyer: Arc<dyn InstanceKeyer>) -> Self {
        self.keyer = keyer;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn store(&self) -> LedgerStore {
        LedgerStore::new(&self.config.output, Arc::clone(&self.fs))
    }

    /// Fresh ledger if none exists at the output path; otherwise reload it,
    /// which fails unless resume was requested.
    pub fn open_ledger(&self) -> Result<Ledger> {
        let store = self.store();
        if store.exists() {
            return Ledger::reload(store, self.config.resume);
        }

        if self.config.resume {
            info!(path = ?store.path(), "nothing to resume; starting a fresh ledger");
        }
        let instances = load_instances(
            self.fs.as_ref(),
            &self.config.graphs_file,
            self.keyer.as_ref(),
        )?;
        let filter = self.config.filter;
        Ledger::initialize(
            store,
            instances,
            &self.config.methods,
            &self.config.executables,
            |instance| filter.accepts(instance),
        )
    }

    /// Run every pending row to a terminal outcome.
    ///
    /// Returns once all workers have stopped. Conflicting results for one
    /// instance are reported as an error after the ledger is fully written.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary> {
        let ledger = Arc::new(self.open_ledger()?);

        if self.config.retry_failed {
            ledger.reset_failures().await?;
        }

        let before = ledger.summary().await;
        info!(
            total = before.total,
            pending = before.pending,
            path = ?ledger.path(),
            "ledger ready"
        );

        let pool = WorkerPool::new(
            Arc::clone(&ledger),
            Arc::clone(&self.runner),
            self.config.pool_size,
            self.config.timeout,
        );
        let this_run = pool.run(cancel.clone()).await?;

        let summary = RunSummary {
            ledger: ledger.summary().await,
            this_run,
            interrupted: cancel.is_cancelled() && !ledger.is_exhausted().await,
        };

        let violations = ledger.integrity_violations().await;
        if !violations.is_empty() {
            for violation in &violations {
                error!(%violation, "conflicting results for the same instance");
            }
            return Err(ExprunError::Integrity(violations));
        }

        Ok(summary)
    }

    /// Describe what a run would do without touching anything on disk.
    ///
    /// Applies the same resume guard as [`run`](Self::run), and counts
    /// failed rows as pending when `--retry-failed` would requeue them.
    pub fn plan(&self) -> Result<LedgerSummary> {
        let store = self.store();
        if store.exists() {
            if !self.config.resume {
                return Err(ExprunError::ResumeConflict(store.path().to_path_buf()));
            }
            let units = store.load()?;
            check_unique(&units)?;
            let mut plan = LedgerSummary::from_units(&units);
            if self.config.retry_failed {
                plan.pending += plan.failure;
                plan.failure = 0;
            }
            return Ok(plan);
        }

        let instances = load_instances(
            self.fs.as_ref(),
            &self.config.graphs_file,
            self.keyer.as_ref(),
        )?;
        let filter = self.config.filter;
        let units = build_units(
            instances,
            &self.config.methods,
            &self.config.executables,
            |instance| filter.accepts(instance),
        )?;
        Ok(LedgerSummary::from_units(&units))
    }
}
