// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawRunConfig, RunConfig};
use crate::errors::Result;

/// Load a config file from a given path.
///
/// This only performs TOML deserialization; semantic checks happen when the
/// layered settings are turned into a [`RunConfig`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Layer CLI flags over the optional config file over built-in defaults,
/// then validate.
pub fn resolve(args: &CliArgs) -> Result<RunConfig> {
    let file = match &args.config {
        Some(path) => load_from_path(path)?,
        None => ConfigFile::default(),
    };
    RunConfig::try_from(layer(args, file))
}

fn layer(args: &CliArgs, file: ConfigFile) -> RawRunConfig {
    let mut raw = RawRunConfig::with_defaults(&args.graphs_file);
    let run = file.run;

    if let Some(n) = args.pool_size.or(run.pool_size) {
        raw.pool_size = n;
    }
    if !args.executables.is_empty() {
        raw.executables = args.executables.clone();
    } else if let Some(execs) = run.executables {
        raw.executables = execs;
    }
    if !args.methods.is_empty() {
        raw.methods = args.methods.clone();
    } else if let Some(methods) = run.methods {
        raw.methods = methods;
    }
    if let Some(out) = args.output.clone().or(run.output) {
        raw.output = out;
    }
    if let Some(secs) = args.timeout.or(run.timeout_secs) {
        raw.timeout_secs = secs;
    }
    if let Some(filter) = args.filter().or(run.filter) {
        raw.filter = filter;
    }
    raw.resume = args.resume_requested();
    raw.retry_failed = args.retry_failed;

    raw
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::types::{Method, StructuralFilter};

    #[test]
    fn defaults_without_file_or_flags() {
        let args = CliArgs::try_parse_from(["exprun", "graphs.txt"]).unwrap();
        let cfg = resolve(&args).unwrap();
        assert_eq!(cfg.pool_size, 1);
        assert_eq!(cfg.executables, vec!["bin/okp-recognition-obj"]);
        assert_eq!(cfg.methods, vec![Method::Ilp, Method::Sat, Method::Dp]);
        assert_eq!(cfg.output, PathBuf::from("data/results.csv"));
        assert_eq!(cfg.timeout, Duration::from_secs(600));
        assert_eq!(cfg.filter, StructuralFilter::Biconnected);
        assert!(!cfg.resume);
    }

    #[test]
    fn cli_flags_win_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[run]
pool_size = 8
methods = ["sat"]
timeout_secs = 30
filter = "all"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args =
            CliArgs::try_parse_from(["exprun", "graphs.txt", "--config", &path, "-p", "2"]).unwrap();
        let cfg = resolve(&args).unwrap();

        assert_eq!(cfg.pool_size, 2);
        assert_eq!(cfg.methods, vec![Method::Sat]);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.filter, StructuralFilter::All);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[run]\nworkers = 3\n").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }
}
