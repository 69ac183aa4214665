//! Shared helpers for the integration tests.

#![allow(dead_code)]

use kettle::TaskError;
use std::convert::Infallible;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Outcome error of a task that cannot fail on its own.
pub type Never = TaskError<Infallible>;

static INIT_LOGGING: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
///
/// Honors `RUST_LOG`, defaulting to `kettle=debug`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kettle=debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}
