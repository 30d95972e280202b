// src/config/mod.rs

//! Run configuration for exprun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated `RunConfig` (`model.rs`).
//! - Load an optional config file and layer CLI flags over it (`loader.rs`).
//! - Validate basic invariants like pool size and method names (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve};
pub use model::{
    ConfigFile, RawRunConfig, RunConfig, RunSection, DEFAULT_EXECUTABLE, DEFAULT_OUTPUT,
    DEFAULT_TIMEOUT_SECS,
};
