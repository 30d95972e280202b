// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::model::{RawRunConfig, RunConfig};
use crate::errors::{ExprunError, Result};
use crate::types::Method;

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = ExprunError;

    fn try_from(raw: RawRunConfig) -> std::result::Result<Self, Self::Error> {
        validate_limits(&raw)?;
        validate_executables(&raw.executables)?;
        let methods = parse_methods(&raw.methods)?;

        if raw.retry_failed && !raw.resume {
            return Err(ExprunError::Config(
                "--retry-failed only makes sense together with --resume".to_string(),
            ));
        }

        Ok(RunConfig {
            graphs_file: raw.graphs_file,
            pool_size: raw.pool_size,
            executables: raw.executables,
            methods,
            output: raw.output,
            timeout: Duration::from_secs(raw.timeout_secs),
            filter: raw.filter,
            resume: raw.resume,
            retry_failed: raw.retry_failed,
        })
    }
}

fn validate_limits(raw: &RawRunConfig) -> Result<()> {
    if raw.pool_size == 0 {
        return Err(ExprunError::Config(
            "pool size must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.timeout_secs == 0 {
        return Err(ExprunError::Config(
            "timeout must be >= 1 second (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_executables(executables: &[String]) -> Result<()> {
    if executables.is_empty() {
        return Err(ExprunError::Config(
            "at least one executable is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for exe in executables {
        if exe.trim().is_empty() {
            return Err(ExprunError::Config("empty executable name".to_string()));
        }
        if !seen.insert(exe.as_str()) {
            return Err(ExprunError::Config(format!(
                "executable '{exe}' is listed more than once"
            )));
        }
    }
    Ok(())
}

fn parse_methods(names: &[String]) -> Result<Vec<Method>> {
    if names.is_empty() {
        return Err(ExprunError::Config(
            "at least one method is required".to_string(),
        ));
    }
    let mut methods = Vec::with_capacity(names.len());
    for name in names {
        let method: Method = name.parse().map_err(ExprunError::Config)?;
        if methods.contains(&method) {
            return Err(ExprunError::Config(format!(
                "method '{method}' is listed more than once"
            )));
        }
        methods.push(method);
    }
    Ok(methods)
}
