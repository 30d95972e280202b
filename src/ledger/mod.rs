// src/ledger/mod.rs

//! The work ledger: every (instance, method, executable) work unit and its
//! outcome, shared by all workers and persisted after every result.
//!
//! Two critical sections per job:
//! - [`Ledger::claim_next`] marks the first unclaimed row as claimed and
//!   hands out its inputs (in memory only).
//! - [`Ledger::record_result`] writes the terminal fields and rewrites the
//!   persisted snapshot before returning.
//!
//! Nothing is held locked while a job runs.

pub mod build;
pub mod integrity;
pub mod store;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{ExprunError, Result};
use crate::instance::Instance;
use crate::types::{Method, Outcome};

pub use build::{build_units, check_unique};
pub use integrity::{find_violations, IntegrityViolation};
pub use store::LedgerStore;

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub instance: String,
    pub instance_key: String,
    pub executable: String,
    pub method: Method,
    pub outcome: Outcome,
    /// Raw solved flag reported by the executable; `Some(false)` on a
    /// successful run means "ran to completion without a solution".
    pub solved: Option<bool>,
    /// Only meaningful together with `outcome`; a timeout records `0`.
    pub result_value: Option<i64>,
    /// Nanoseconds as reported by the executable, or the timeout.
    pub elapsed: Option<u64>,
    /// Measured wall-clock nanoseconds of the subprocess.
    pub wall_elapsed: Option<u64>,
}

impl WorkUnit {
    pub fn pending(instance: &Instance, executable: &str, method: Method) -> Self {
        Self {
            instance: instance.payload.clone(),
            instance_key: instance.key.clone(),
            executable: executable.to_string(),
            method,
            outcome: Outcome::Unset,
            solved: None,
            result_value: None,
            elapsed: None,
            wall_elapsed: None,
        }
    }

    fn apply(&mut self, result: &JobResult) {
        self.outcome = result.outcome;
        self.solved = result.solved;
        self.result_value = result.result_value;
        self.elapsed = result.elapsed;
        self.wall_elapsed = result.wall_elapsed;
    }

    fn clear(&mut self) {
        self.outcome = Outcome::Unset;
        self.solved = None;
        self.result_value = None;
        self.elapsed = None;
        self.wall_elapsed = None;
    }
}

/// Terminal fields produced by running one work unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub outcome: Outcome,
    pub solved: Option<bool>,
    pub result_value: Option<i64>,
    pub elapsed: Option<u64>,
    pub wall_elapsed: Option<u64>,
}

impl JobResult {
    pub fn success(solved: bool, value: i64, reported_ns: u64, wall: Duration) -> Self {
        Self {
            outcome: Outcome::Success,
            solved: Some(solved),
            result_value: Some(value),
            elapsed: Some(reported_ns),
            wall_elapsed: Some(nanos(wall)),
        }
    }

    pub fn failure(wall: Duration) -> Self {
        Self {
            outcome: Outcome::Failure,
            solved: None,
            result_value: None,
            elapsed: None,
            wall_elapsed: Some(nanos(wall)),
        }
    }

    /// Sentinel row for a job that was killed at `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            outcome: Outcome::Timeout,
            solved: Some(false),
            result_value: Some(0),
            elapsed: Some(nanos(timeout)),
            wall_elapsed: Some(nanos(timeout)),
        }
    }
}

pub fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Inputs of a claimed row, handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHandle {
    pub index: usize,
    pub instance: String,
    pub instance_key: String,
    pub method: Method,
    pub executable: String,
}

/// Counts per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSummary {
    pub total: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub success: usize,
    pub solved: usize,
    pub failure: usize,
    pub timeout: usize,
}

impl LedgerSummary {
    /// Tally persisted rows; nothing is in flight outside a running ledger.
    pub fn from_units(units: &[WorkUnit]) -> Self {
        Self::tally(units.iter().map(|unit| (unit, false)))
    }

    fn from_rows(rows: &[LedgerRow]) -> Self {
        Self::tally(rows.iter().map(|row| (&row.unit, row.claimed)))
    }

    fn tally<'a>(rows: impl Iterator<Item = (&'a WorkUnit, bool)>) -> Self {
        let mut s = Self::default();
        for (unit, claimed) in rows {
            s.total += 1;
            match unit.outcome {
                Outcome::Unset if claimed => s.in_flight += 1,
                Outcome::Unset => s.pending += 1,
                Outcome::Success => {
                    s.success += 1;
                    if unit.solved == Some(true) {
                        s.solved += 1;
                    }
                }
                Outcome::Failure => s.failure += 1,
                Outcome::Timeout => s.timeout += 1,
            }
        }
        s
    }

    pub fn completed(&self) -> usize {
        self.success + self.failure + self.timeout
    }
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} success ({} solved), {} failure, {} timeout, {} pending",
            self.total,
            self.success,
            self.solved,
            self.failure,
            self.timeout,
            self.pending + self.in_flight
        )
    }
}

#[derive(Debug)]
struct LedgerRow {
    unit: WorkUnit,
    claimed: bool,
}

/// Shared, durable table of work units.
#[derive(Debug)]
pub struct Ledger {
    rows: Mutex<Vec<LedgerRow>>,
    /// Row indices per instance key; fixed once the ledger is built.
    by_key: HashMap<String, Vec<usize>>,
    store: LedgerStore,
}

impl Ledger {
    /// Build a fresh ledger from the cross product of `instances`,
    /// `executables` and `methods`, and persist it before returning.
    ///
    /// Refuses to run if a file already exists at the store's path.
    pub fn initialize<F>(
        store: LedgerStore,
        instances: Vec<Instance>,
        methods: &[Method],
        executables: &[String],
        filter: F,
    ) -> Result<Self>
    where
        F: Fn(&Instance) -> bool,
    {
        if store.exists() {
            return Err(ExprunError::ResumeConflict(store.path().to_path_buf()));
        }

        let units = build_units(instances, methods, executables, filter)?;
        store.save(&units)?;
        info!(rows = units.len(), path = ?store.path(), "initialised ledger");

        Ok(Self::from_units(units, store))
    }

    /// Load a previously persisted ledger.
    ///
    /// `resume` must be true: an existing ledger is never picked up by
    /// accident.
    pub fn reload(store: LedgerStore, resume: bool) -> Result<Self> {
        if !resume {
            return Err(ExprunError::ResumeConflict(store.path().to_path_buf()));
        }

        let units = store.load()?;
        check_unique(&units)?;
        info!(rows = units.len(), path = ?store.path(), "reloaded ledger");

        Ok(Self::from_units(units, store))
    }

    fn from_units(units: Vec<WorkUnit>, store: LedgerStore) -> Self {
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, unit) in units.iter().enumerate() {
            by_key.entry(unit.instance_key.clone()).or_default().push(index);
        }
        let rows = units
            .into_iter()
            .map(|unit| LedgerRow {
                claimed: unit.outcome.is_terminal(),
                unit,
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
            by_key,
            store,
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Claim the first unclaimed row, or `None` if every row is taken.
    pub async fn claim_next(&self) -> Option<RowHandle> {
        let mut rows = self.rows.lock().await;
        let (index, row) = rows.iter_mut().enumerate().find(|(_, row)| !row.claimed)?;
        row.claimed = true;
        debug!(row = index, method = %row.unit.method, executable = %row.unit.executable, "claimed row");

        Some(RowHandle {
            index,
            instance: row.unit.instance.clone(),
            instance_key: row.unit.instance_key.clone(),
            method: row.unit.method,
            executable: row.unit.executable.clone(),
        })
    }

    /// Write the terminal fields of a claimed row and persist the whole
    /// ledger. Returns only after the snapshot is on stable storage.
    pub async fn record_result(&self, index: usize, result: &JobResult) -> Result<()> {
        if !result.outcome.is_terminal() {
            return Err(ExprunError::LedgerState(format!(
                "row {index}: cannot record a non-terminal outcome"
            )));
        }

        let mut rows = self.rows.lock().await;
        let row = rows
            .get_mut(index)
            .ok_or_else(|| ExprunError::LedgerState(format!("row {index} does not exist")))?;
        if !row.claimed {
            return Err(ExprunError::LedgerState(format!(
                "row {index} was recorded without being claimed"
            )));
        }
        if row.unit.outcome.is_terminal() {
            return Err(ExprunError::LedgerState(format!(
                "row {index} already has outcome {}",
                row.unit.outcome
            )));
        }
        row.unit.apply(result);

        if result.outcome == Outcome::Success {
            let siblings = self
                .by_key
                .get(&rows[index].unit.instance_key)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for violation in find_violations(siblings.iter().map(|&i| &rows[i].unit)) {
                warn!(%violation, "conflicting results for the same instance");
            }
        }

        self.store.persist(rows.iter().map(|r| &r.unit)).await?;
        debug!(row = index, outcome = %result.outcome, "recorded result");
        Ok(())
    }

    /// Give a claimed but unfinished row back (e.g. its job was cancelled).
    pub async fn release(&self, index: usize) {
        let mut rows = self.rows.lock().await;
        if let Some(row) = rows.get_mut(index) {
            if !row.unit.outcome.is_terminal() {
                row.claimed = false;
            }
        }
    }

    /// True iff no row is left to claim.
    pub async fn is_exhausted(&self) -> bool {
        self.rows.lock().await.iter().all(|row| row.claimed)
    }

    /// Put every `failure` row back into the queue and persist.
    ///
    /// This is never done implicitly by a resume.
    pub async fn reset_failures(&self) -> Result<usize> {
        let mut rows = self.rows.lock().await;
        let mut reset = 0;
        for row in rows.iter_mut() {
            if row.unit.outcome == Outcome::Failure {
                row.unit.clear();
                row.claimed = false;
                reset += 1;
            }
        }
        if reset > 0 {
            self.store.persist(rows.iter().map(|r| &r.unit)).await?;
            info!(rows = reset, "failed rows queued for another attempt");
        }
        Ok(reset)
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Copy of every row, in ledger order.
    pub async fn snapshot(&self) -> Vec<WorkUnit> {
        self.rows
            .lock()
            .await
            .iter()
            .map(|row| row.unit.clone())
            .collect()
    }

    pub async fn summary(&self) -> LedgerSummary {
        LedgerSummary::from_rows(&self.rows.lock().await)
    }

    pub async fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let rows = self.rows.lock().await;
        find_violations(rows.iter().map(|r| &r.unit))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn store(fs: &MockFileSystem) -> LedgerStore {
        LedgerStore::new("out/results.csv", Arc::new(fs.clone()))
    }

    fn instances() -> Vec<Instance> {
        vec![Instance::new("g1", "k1"), Instance::new("g2", "k2")]
    }

    fn fresh(fs: &MockFileSystem) -> Ledger {
        Ledger::initialize(
            store(fs),
            instances(),
            &[Method::Ilp, Method::Sat],
            &["bin/a".to_string()],
            |_| true,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn initialize_persists_all_rows_unset() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);

        assert_eq!(ledger.len().await, 4);
        assert_eq!(fs.write_count(), 1);
        let text = fs.contents("out/results.csv").unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().skip(1).all(|l| l.ends_with(",unset")));
    }

    #[tokio::test]
    async fn claims_walk_rows_in_order_until_exhausted() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);

        let mut seen = Vec::new();
        while let Some(row) = ledger.claim_next().await {
            seen.push((row.index, row.instance_key, row.method));
        }
        assert_eq!(
            seen,
            vec![
                (0, "k1".to_string(), Method::Ilp),
                (1, "k1".to_string(), Method::Sat),
                (2, "k2".to_string(), Method::Ilp),
                (3, "k2".to_string(), Method::Sat),
            ]
        );
        assert!(ledger.is_exhausted().await);
        // Claiming alone never touches storage.
        assert_eq!(fs.write_count(), 1);
    }

    #[tokio::test]
    async fn record_persists_and_is_final() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);
        let row = ledger.claim_next().await.unwrap();

        let result = JobResult::success(true, 4, 1000, Duration::from_millis(5));
        ledger.record_result(row.index, &result).await.unwrap();
        assert_eq!(fs.write_count(), 2);
        assert!(fs.contents("out/results.csv").unwrap().contains(",1,4,1000,5000000,success"));

        let again = ledger.record_result(row.index, &JobResult::failure(Duration::ZERO)).await;
        assert!(matches!(again, Err(ExprunError::LedgerState(_))));
    }

    #[tokio::test]
    async fn recording_an_unclaimed_row_is_rejected() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);
        let err = ledger
            .record_result(2, &JobResult::timeout(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExprunError::LedgerState(_)));
    }

    #[tokio::test]
    async fn write_failures_surface_as_errors() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);
        let row = ledger.claim_next().await.unwrap();

        fs.set_fail_writes(true);
        let err = ledger
            .record_result(row.index, &JobResult::failure(Duration::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, ExprunError::Other(_)));
    }

    #[tokio::test]
    async fn reload_needs_explicit_resume() {
        let fs = MockFileSystem::new();
        let _ = fresh(&fs);

        let err = Ledger::reload(store(&fs), false).unwrap_err();
        assert!(matches!(err, ExprunError::ResumeConflict(_)));

        let err = Ledger::initialize(store(&fs), instances(), &[Method::Dp], &["bin/a".into()], |_| true)
            .unwrap_err();
        assert!(matches!(err, ExprunError::ResumeConflict(_)));
    }

    #[tokio::test]
    async fn reload_only_offers_unset_rows() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);
        let first = ledger.claim_next().await.unwrap();
        let second = ledger.claim_next().await.unwrap();
        ledger
            .record_result(first.index, &JobResult::success(true, 2, 10, Duration::ZERO))
            .await
            .unwrap();
        ledger
            .record_result(second.index, &JobResult::failure(Duration::ZERO))
            .await
            .unwrap();
        // Third row claimed but never finished: it must come back.
        let _in_flight = ledger.claim_next().await.unwrap();
        drop(ledger);

        let reloaded = Ledger::reload(store(&fs), true).unwrap();
        let summary = reloaded.summary().await;
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failure, 1);
        assert_eq!(summary.pending, 2);

        let next = reloaded.claim_next().await.unwrap();
        assert_eq!(next.index, 2);
    }

    #[tokio::test]
    async fn reset_failures_requeues_only_failures() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);
        let a = ledger.claim_next().await.unwrap();
        let b = ledger.claim_next().await.unwrap();
        ledger.record_result(a.index, &JobResult::failure(Duration::ZERO)).await.unwrap();
        ledger
            .record_result(b.index, &JobResult::timeout(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(ledger.reset_failures().await.unwrap(), 1);
        assert_eq!(ledger.claim_next().await.unwrap().index, 0);
    }

    #[tokio::test]
    async fn release_returns_row_to_pool() {
        let fs = MockFileSystem::new();
        let ledger = fresh(&fs);
        let row = ledger.claim_next().await.unwrap();
        ledger.release(row.index).await;
        assert_eq!(ledger.claim_next().await.unwrap().index, row.index);
    }
}
