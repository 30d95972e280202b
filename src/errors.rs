// src/errors.rs

//! Crate-wide error type.
//!
//! Only construction-time problems and ledger I/O surface as `ExprunError`.
//! Anything that goes wrong inside a single job is captured as a
//! [`crate::types::Outcome`] and never becomes an `Err`.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::IntegrityViolation;

#[derive(Error, Debug)]
pub enum ExprunError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Instance source error: {0}")]
    InstanceSource(String),

    #[error(
        "Duplicate instance: two different instances share key '{key}'\n  first:  {first}\n  second: {second}"
    )]
    DuplicateInstance {
        key: String,
        first: String,
        second: String,
    },

    #[error("Output file {0:?} already exists. Use --resume to resume the experiments.")]
    ResumeConflict(PathBuf),

    #[error("Ledger format error: {0}")]
    LedgerFormat(String),

    #[error("Ledger state error: {0}")]
    LedgerState(String),

    #[error("Integrity violation: {} instance key(s) have conflicting results", .0.len())]
    Integrity(Vec<IntegrityViolation>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExprunError>;
