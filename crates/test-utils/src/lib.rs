pub mod builders;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use exprun::logging::{env_filter, LOG_ENV};
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// Default budget for a single async test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Route exprun's logs into the test harness.
///
/// Uses the same `EXPRUN_LOG` directives as the binary, e.g.
/// `EXPRUN_LOG=exprun::ledger=debug cargo test -- --nocapture`.
/// Captured output is only shown for failing tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV).ok();
        let _ = fmt()
            .with_env_filter(env_filter(None, env.as_deref()))
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_of(TEST_TIMEOUT, f).await
}

/// Await `f`, panicking if it takes longer than `limit`.
pub async fn with_timeout_of<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {limit:?}"),
    }
}
