// src/ledger/store.rs

//! CSV persistence for the ledger.
//!
//! The whole table is rewritten on every save (header + one row per work
//! unit) through [`FileSystem::write_atomic`]. Claim bookkeeping never
//! reaches the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::errors::{ExprunError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::ledger::WorkUnit;
use crate::types::{Method, Outcome};

/// Column order of the persisted file.
pub const COLUMNS: [&str; 9] = [
    "instance",
    "instance_key",
    "executable",
    "method",
    "solved",
    "result_value",
    "elapsed",
    "wall_elapsed",
    "outcome",
];

const REQUIRED_COLUMNS: [&str; 7] = [
    "instance",
    "instance_key",
    "executable",
    "method",
    "result_value",
    "elapsed",
    "outcome",
];

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRecord {
    instance: String,
    instance_key: String,
    executable: String,
    method: String,
    #[serde(default)]
    solved: Option<u8>,
    #[serde(default)]
    result_value: Option<i64>,
    #[serde(default)]
    elapsed: Option<u64>,
    #[serde(default)]
    wall_elapsed: Option<u64>,
    #[serde(default)]
    outcome: String,
}

impl From<&WorkUnit> for LedgerRecord {
    fn from(unit: &WorkUnit) -> Self {
        Self {
            instance: unit.instance.clone(),
            instance_key: unit.instance_key.clone(),
            executable: unit.executable.clone(),
            method: unit.method.to_string(),
            solved: unit.solved.map(u8::from),
            result_value: unit.result_value,
            elapsed: unit.elapsed,
            wall_elapsed: unit.wall_elapsed,
            outcome: unit.outcome.to_string(),
        }
    }
}

impl LedgerRecord {
    fn into_unit(self, line: usize) -> Result<WorkUnit> {
        let bad = |msg: String| ExprunError::LedgerFormat(format!("line {line}: {msg}"));

        let method: Method = self.method.parse().map_err(bad)?;
        let outcome: Outcome = self.outcome.parse().map_err(bad)?;
        let solved = match self.solved {
            None => None,
            Some(0) => Some(false),
            Some(1) => Some(true),
            Some(other) => return Err(bad(format!("solved must be 0 or 1, got {other}"))),
        };
        if outcome == Outcome::Success && (solved.is_none() || self.result_value.is_none()) {
            return Err(bad(
                "success row without solved flag or result_value".to_string(),
            ));
        }

        Ok(WorkUnit {
            instance: self.instance,
            instance_key: self.instance_key,
            executable: self.executable,
            method,
            outcome,
            solved,
            result_value: self.result_value,
            elapsed: self.elapsed,
            wall_elapsed: self.wall_elapsed,
        })
    }
}

/// Serialize work units into the persisted CSV layout.
pub fn encode<'a>(units: impl IntoIterator<Item = &'a WorkUnit>) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for unit in units {
        writer.serialize(LedgerRecord::from(unit))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExprunError::Io(std::io::Error::other(e.error().to_string())))
}

/// Parse the persisted CSV layout back into work units.
pub fn decode(text: &str) -> Result<Vec<WorkUnit>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ExprunError::LedgerFormat(format!(
                "missing required column '{column}'"
            )));
        }
    }

    let mut units = Vec::new();
    for (idx, record) in reader.deserialize::<LedgerRecord>().enumerate() {
        units.push(record?.into_unit(idx + 2)?);
    }
    Ok(units)
}

/// Where and how the ledger is persisted.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Store backed by the real filesystem.
    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(RealFileSystem))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    pub fn load(&self) -> Result<Vec<WorkUnit>> {
        let text = self.fs.read_to_string(&self.path)?;
        decode(&text)
    }

    pub fn save<'a>(&self, units: impl IntoIterator<Item = &'a WorkUnit>) -> Result<()> {
        let bytes = encode(units)?;
        self.fs.write_atomic(&self.path, &bytes)?;
        Ok(())
    }
    /// [`save`](Self::save) with the file I/O moved onto the blocking pool,
    /// so an fsync never stalls a runtime thread.
    pub async fn persist<'a>(&self, units: impl IntoIterator<Item = &'a WorkUnit>) -> Result<()> {
        let bytes = encode(units)?;
        let fs = Arc::clone(&self.fs);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || fs.write_atomic(&path, &bytes))
            .await
            .map_err(|e| ExprunError::Other(anyhow::anyhow!("ledger write task failed: {e}")))??;
        Ok(())
    }
}
