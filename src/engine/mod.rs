// src/engine/mod.rs

//! Orchestration engine for exprun.
//!
//! - [`pool`] runs a fixed number of claim/dispatch/record workers against
//!   the shared ledger.
//! - [`orchestrator`] decides between a fresh and a resumed ledger, starts
//!   the pool and reports the final state.

pub mod orchestrator;
pub mod pool;

pub use orchestrator::{Orchestrator, RunSummary};
pub use pool::{WorkerPool, WorkerStats};
