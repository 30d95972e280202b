// src/exec/mod.rs

//! Job dispatch layer.
//!
//! This module is responsible for actually running the solver executables,
//! using `tokio::process::Command`, and translating how they ended into the
//! ledger's outcome vocabulary.
//!
//! - [`backend`] provides the `JobRunner` trait that workers call, which
//!   tests can replace with a fake implementation.
//! - [`task_runner`] is the production runner for solver subprocesses.
//! - [`protocol`] parses the solver's `solved value elapsed` report.
//! - [`process_tree`] kills a job together with its children.

pub mod backend;
pub mod process_tree;
pub mod protocol;
pub mod task_runner;

pub use backend::{JobRun, JobRunner};
pub use protocol::{parse_report, ProtocolError, SolverReport};
pub use task_runner::ProcessJobRunner;
