// tests/error_handling.rs

mod common;
use crate::common::{init_tracing, THREE_GRAPHS};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use exprun::config::{RawRunConfig, RunConfig};
use exprun::engine::Orchestrator;
use exprun::errors::ExprunError;
use exprun::fs::mock::MockFileSystem;
use exprun::ledger::LedgerStore;
use exprun::types::{Method, Outcome};
use exprun_test_utils::builders::RunConfigBuilder;
use exprun_test_utils::fake_runner::{FakeJobRunner, FakeReply};

fn orchestrator(fs: &MockFileSystem, runner: FakeJobRunner) -> Orchestrator<FakeJobRunner> {
    let config = RunConfigBuilder::new("graphs.txt", "results.csv")
        .methods(&["ilp", "sat"])
        .executables(&["bin/solver"])
        .build();
    Orchestrator::new(config, runner).with_fs(Arc::new(fs.clone()))
}

#[test]
fn invalid_config_values_are_rejected() {
    let cases: Vec<(&str, Box<dyn Fn(&mut RawRunConfig)>)> = vec![
        ("pool size", Box::new(|raw: &mut RawRunConfig| raw.pool_size = 0)),
        ("timeout", Box::new(|raw: &mut RawRunConfig| raw.timeout_secs = 0)),
        ("executable", Box::new(|raw: &mut RawRunConfig| raw.executables.clear())),
        ("method", Box::new(|raw: &mut RawRunConfig| raw.methods = vec!["greedy".to_string()])),
        ("retry", Box::new(|raw: &mut RawRunConfig| raw.retry_failed = true)),
    ];

    for (what, mutate) in cases {
        let mut raw = RawRunConfig::with_defaults("graphs.txt");
        mutate(&mut raw);
        let err = RunConfig::try_from(raw).expect_err(what);
        assert!(matches!(err, ExprunError::Config(_)), "{what}: {err:?}");
    }
}

#[tokio::test]
async fn missing_graphs_file_is_fatal() {
    init_tracing();
    let fs = MockFileSystem::new();
    let err = orchestrator(&fs, FakeJobRunner::always(1))
        .run(CancellationToken::new())
        .await
        .expect_err("no graphs file");
    assert!(matches!(err, ExprunError::Other(_)), "{err:?}");
}

#[tokio::test]
async fn graphs_file_without_blocks_is_fatal() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("graphs.txt", "nothing to see here\n");

    let err = orchestrator(&fs, FakeJobRunner::always(1))
        .run(CancellationToken::new())
        .await
        .expect_err("no graphs");
    assert!(matches!(err, ExprunError::InstanceSource(_)), "{err:?}");
    assert!(fs.contents("results.csv").is_none());
}

#[tokio::test]
async fn corrupt_ledger_is_not_resumed() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("graphs.txt", THREE_GRAPHS);
    fs.add_file("results.csv", "instance,method\ng,ilp\n");

    let config = RunConfigBuilder::new("graphs.txt", "results.csv")
        .resume(true)
        .build();
    let runner = FakeJobRunner::always(1);
    let err = Orchestrator::new(config, runner.clone())
        .with_fs(Arc::new(fs.clone()))
        .run(CancellationToken::new())
        .await
        .expect_err("corrupt ledger");

    assert!(matches!(err, ExprunError::LedgerFormat(_)), "{err:?}");
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn unknown_method_in_ledger_is_a_format_error() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file(
        "results.csv",
        "instance,instance_key,executable,method,result_value,elapsed,outcome\n\
         g,A_,bin/solver,greedy,,,\n",
    );

    let err = LedgerStore::new("results.csv", Arc::new(fs))
        .load()
        .expect_err("unknown method");
    assert!(matches!(err, ExprunError::LedgerFormat(_)), "{err:?}");
}

#[tokio::test]
async fn ledger_write_failure_stops_the_run() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("graphs.txt", THREE_GRAPHS);

    let failing = fs.clone();
    let runner = FakeJobRunner::new(move |_| {
        failing.set_fail_writes(true);
        FakeReply::Solved(4)
    });

    let err = orchestrator(&fs, runner.clone())
        .run(CancellationToken::new())
        .await
        .expect_err("write failure must surface");
    assert!(matches!(err, ExprunError::Other(_)), "{err:?}");
    assert_eq!(runner.call_count(), 1);
}

#[tokio::test]
async fn conflicting_values_fail_after_the_ledger_is_complete() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("graphs.txt", "graph tri { a -- b -- c -- a; }");

    let runner = FakeJobRunner::new(|job| match job.method {
        Method::Ilp => FakeReply::Solved(3),
        _ => FakeReply::Solved(4),
    });
    let err = orchestrator(&fs, runner)
        .run(CancellationToken::new())
        .await
        .expect_err("integrity violation");

    let ExprunError::Integrity(violations) = err else {
        panic!("expected Integrity, got {err:?}");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].instance_key, "Bw");

    let rows = LedgerStore::new("results.csv", Arc::new(fs.clone()))
        .load()
        .expect("ledger persisted");
    assert!(rows.iter().all(|r| r.outcome == Outcome::Success));
}

#[tokio::test]
async fn unsolved_rows_do_not_count_as_conflicts() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("graphs.txt", "graph tri { a -- b -- c -- a; }");

    let runner = FakeJobRunner::new(|job| match job.method {
        Method::Ilp => FakeReply::Solved(3),
        _ => FakeReply::Unsolved,
    });
    let summary = orchestrator(&fs, runner)
        .run(CancellationToken::new())
        .await
        .expect("no conflict");
    assert_eq!(summary.ledger.solved, 1);
}
