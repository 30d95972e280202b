// src/logging.rs

//! Logging setup for `exprun` using `tracing` + `tracing-subscriber`.
//!
//! Filter priority:
//! 1. `--log-level` CLI flag: applies to exprun itself, dependencies stay at `warn`
//! 2. `EXPRUN_LOG` environment variable, as `EnvFilter` directives
//!    (e.g. `debug` or `warn,exprun::exec=trace`)
//! 3. `warn,exprun=info`
//!
//! Logs go to STDERR; STDOUT only carries the final run summary.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "EXPRUN_LOG";

const DEFAULT_DIRECTIVES: &str = "warn,exprun=info";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();

    fmt()
        .with_env_filter(env_filter(cli_level, env.as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Build the filter from the CLI level and the raw `EXPRUN_LOG` value.
///
/// Unparseable env directives fall back to the default.
pub fn env_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(format!("warn,exprun={}", level_name(level)));
    }
    env.filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
