use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use exprun::config::{RawRunConfig, RunConfig};
use exprun::fs::mock::MockFileSystem;
use exprun::instance::Instance;
use exprun::ledger::{Ledger, LedgerStore};
use exprun::types::{Method, StructuralFilter};

/// `n` distinct instances keyed `k0..k{n-1}`.
pub fn instances(n: usize) -> Vec<Instance> {
    (0..n)
        .map(|i| Instance::new(format!("graph g{i} {{ a{i} -- b{i}; }}"), format!("k{i}")))
        .collect()
}

/// Builder for a `Ledger` persisted into a `MockFileSystem`.
pub struct LedgerBuilder {
    fs: MockFileSystem,
    path: PathBuf,
    instances: Vec<Instance>,
    methods: Vec<Method>,
    executables: Vec<String>,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self {
            fs: MockFileSystem::new(),
            path: PathBuf::from("data/results.csv"),
            instances: instances(3),
            methods: vec![Method::Ilp, Method::Sat],
            executables: vec!["bin/solver".to_string()],
        }
    }

    pub fn fs(mut self, fs: MockFileSystem) -> Self {
        self.fs = fs;
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn instance_count(mut self, n: usize) -> Self {
        self.instances = instances(n);
        self
    }

    pub fn methods(mut self, methods: &[Method]) -> Self {
        self.methods = methods.to_vec();
        self
    }

    pub fn executables(mut self, executables: &[&str]) -> Self {
        self.executables = executables.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Store pointing at the builder's path and filesystem.
    pub fn store(&self) -> LedgerStore {
        LedgerStore::new(self.path.clone(), Arc::new(self.fs.clone()))
    }

    pub fn build(self) -> Ledger {
        Ledger::initialize(
            self.store(),
            self.instances,
            &self.methods,
            &self.executables,
            |_| true,
        )
        .expect("Failed to initialise ledger from builder")
    }
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a validated `RunConfig`.
pub struct RunConfigBuilder {
    raw: RawRunConfig,
}

impl RunConfigBuilder {
    pub fn new(graphs_file: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let mut raw = RawRunConfig::with_defaults(graphs_file);
        raw.output = output.into();
        raw.filter = StructuralFilter::All;
        Self { raw }
    }

    pub fn pool_size(mut self, n: usize) -> Self {
        self.raw.pool_size = n;
        self
    }

    pub fn methods(mut self, methods: &[&str]) -> Self {
        self.raw.methods = methods.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn executables(mut self, executables: &[&str]) -> Self {
        self.raw.executables = executables.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.raw.timeout_secs = timeout.as_secs();
        self
    }

    pub fn filter(mut self, filter: StructuralFilter) -> Self {
        self.raw.filter = filter;
        self
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.raw.resume = resume;
        self
    }

    pub fn retry_failed(mut self, retry: bool) -> Self {
        self.raw.retry_failed = retry;
        self
    }

    pub fn build(self) -> RunConfig {
        RunConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}
