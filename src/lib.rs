// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod instance;
pub mod ledger;
pub mod logging;
pub mod types;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::RunConfig;
use crate::engine::{Orchestrator, RunSummary};
use crate::exec::ProcessJobRunner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (CLI over TOML over defaults)
/// - the orchestrator with the real process runner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config = config::resolve(&args)?;
    let orchestrator = Orchestrator::new(config, ProcessJobRunner::new());

    if args.dry_run {
        let plan = orchestrator.plan()?;
        print_dry_run(orchestrator.config(), &plan);
        return Ok(());
    }

    // Ctrl-C -> kill in-flight solvers; their rows stay pending for --resume.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("Ctrl+C received; stopping workers");
            cancel.cancel();
        });
    }

    let summary = orchestrator.run(cancel).await?;
    print_summary(&summary);

    if summary.interrupted {
        anyhow::bail!(
            "run interrupted; use --resume to continue from {:?}",
            orchestrator.config().output
        );
    }
    info!("all work units completed");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "this run: {} completed ({} success, {} failure, {} timeout)",
        summary.this_run.completed(),
        summary.this_run.success,
        summary.this_run.failure,
        summary.this_run.timeout
    );
    println!("ledger:   {}", summary.ledger);
}

fn print_dry_run(cfg: &RunConfig, plan: &ledger::LedgerSummary) {
    println!("exprun dry-run");
    println!("  graphs file = {:?}", cfg.graphs_file);
    println!("  output      = {:?}", cfg.output);
    println!("  pool size   = {}", cfg.pool_size);
    println!("  timeout     = {}s", cfg.timeout.as_secs());
    println!("  filter      = {:?}", cfg.filter);
    println!("  resume      = {}", cfg.resume);
    println!();

    println!("executables ({}):", cfg.executables.len());
    for exe in &cfg.executables {
        println!("  - {exe}");
    }
    let methods: Vec<_> = cfg.methods.iter().map(|m| m.as_str()).collect();
    println!("methods: {}", methods.join(", "));
    println!();
    println!("ledger: {plan}");
}
