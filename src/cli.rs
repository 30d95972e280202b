// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every knob that also exists in the optional TOML config is an `Option`
//! (or an empty `Vec`) here so we can tell "not given" apart from "given the
//! default value" when layering CLI over file over built-in defaults.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::StructuralFilter;

/// Command-line arguments for `exprun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "exprun",
    version,
    about = "Run solver executables over a batch of graph instances and keep a resumable results ledger.",
    long_about = None
)]
pub struct CliArgs {
    /// File containing graphs in Graphviz (DOT) format.
    #[arg(value_name = "GRAPHS_FILE")]
    pub graphs_file: PathBuf,

    /// Number of solver processes to run at the same time (default: 1).
    #[arg(short = 'p', long = "pool-size", visible_alias = "subprocesses", value_name = "N")]
    pub pool_size: Option<usize>,

    /// Executables separated by ',' (default: bin/okp-recognition-obj).
    #[arg(
        short = 'b',
        long = "executables",
        visible_alias = "bin-executables",
        value_name = "LIST",
        value_delimiter = ','
    )]
    pub executables: Vec<String>,

    /// Output ledger (CSV) for all evaluations (default: data/results.csv).
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Methods separated by ','; possible values: ilp, sat, dp (default: ilp,sat,dp).
    #[arg(short = 'm', long = "methods", value_name = "LIST", value_delimiter = ',')]
    pub methods: Vec<String>,

    /// Timeout for each solver process in seconds (default: 600).
    #[arg(short = 't', long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Resume the experiments from an existing output file.
    #[arg(long, overrides_with = "no_resume")]
    pub resume: bool,

    /// Refuse to touch an existing output file (default).
    #[arg(long = "no-resume", overrides_with = "resume")]
    pub no_resume: bool,

    /// Only use biconnected graphs (default).
    #[arg(long, overrides_with_all = ["no_biconnected", "all_instances"])]
    pub biconnected: bool,

    /// Only use graphs that are not biconnected.
    #[arg(long = "no-biconnected", overrides_with_all = ["biconnected", "all_instances"])]
    pub no_biconnected: bool,

    /// Use every graph regardless of its structure.
    #[arg(long = "all-instances", overrides_with_all = ["biconnected", "no_biconnected"])]
    pub all_instances: bool,

    /// When resuming, put rows that previously failed back into the queue.
    #[arg(long = "retry-failed")]
    pub retry_failed: bool,

    /// Optional TOML file with a `[run]` table of defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXPRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Build or load the ledger view and print the plan, but don't run or
    /// write anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Resume only when explicitly asked; `--no-resume` wins if it came last.
    pub fn resume_requested(&self) -> bool {
        self.resume && !self.no_resume
    }

    /// Structural filter chosen on the command line, if any.
    pub fn filter(&self) -> Option<StructuralFilter> {
        if self.all_instances {
            Some(StructuralFilter::All)
        } else if self.no_biconnected {
            Some(StructuralFilter::NotBiconnected)
        } else if self.biconnected {
            Some(StructuralFilter::Biconnected)
        } else {
            None
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
