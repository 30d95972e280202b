// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{Method, StructuralFilter};

pub const DEFAULT_EXECUTABLE: &str = "bin/okp-recognition-obj";
pub const DEFAULT_OUTPUT: &str = "data/results.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_POOL_SIZE: usize = 1;

/// Optional config file as read from TOML.
///
/// ```toml
/// [run]
/// pool_size = 12
/// executables = ["bin/okp-recognition-obj", "bin/okp-recognition-fast"]
/// methods = ["ilp", "sat"]
/// output = "data/results.csv"
/// timeout_secs = 300
/// filter = "biconnected"
/// ```
///
/// Every key is optional; CLI flags win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub run: RunSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    pub pool_size: Option<usize>,
    pub executables: Option<Vec<String>>,
    pub methods: Option<Vec<String>>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub filter: Option<StructuralFilter>,
}

/// Fully layered but not yet validated settings.
///
/// Method names are still strings here so that validation can report the
/// offending name.
#[derive(Debug, Clone)]
pub struct RawRunConfig {
    pub graphs_file: PathBuf,
    pub pool_size: usize,
    pub executables: Vec<String>,
    pub methods: Vec<String>,
    pub output: PathBuf,
    pub timeout_secs: u64,
    pub filter: StructuralFilter,
    pub resume: bool,
    pub retry_failed: bool,
}

impl RawRunConfig {
    /// Built-in defaults for everything except the graphs file.
    pub fn with_defaults(graphs_file: impl Into<PathBuf>) -> Self {
        Self {
            graphs_file: graphs_file.into(),
            pool_size: DEFAULT_POOL_SIZE,
            executables: vec![DEFAULT_EXECUTABLE.to_string()],
            methods: Method::ALL.iter().map(|m| m.to_string()).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            filter: StructuralFilter::default(),
            resume: false,
            retry_failed: false,
        }
    }
}

/// Validated run configuration. Construct through `RunConfig::try_from`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub graphs_file: PathBuf,
    pub pool_size: usize,
    pub executables: Vec<String>,
    pub methods: Vec<Method>,
    pub output: PathBuf,
    pub timeout: Duration,
    pub filter: StructuralFilter,
    pub resume: bool,
    pub retry_failed: bool,
}
