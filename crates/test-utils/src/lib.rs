pub mod builders;
pub mod fake_executor;
pub mod fake_host;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test subscriber, once per test binary.
///
/// Uses `with_test_writer()`, so output is captured per test and only
/// shown for failures (or with `-- --nocapture`). `RUST_LOG` overrides
/// the default filter; the default keeps serverun's own traces at
/// debug so a failing test shows what the runtime was doing.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,serverun=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Bound a future so a stuck test fails instead of hanging the suite.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("test future timed out after 5 seconds")
}
