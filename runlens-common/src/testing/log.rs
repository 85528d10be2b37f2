//! Structured test logging for CI debugging.
//!
//! Call [`init_test_logging`] at the top of a test to capture `tracing`
//! events as JSON lines in the test output:
//!
//! ```ignore
//! use runlens_common::testing::init_test_logging;
//!
//! #[test]
//! fn test_example() {
//!     init_test_logging(); // Safe to call multiple times
//!     tracing::info!(clusters = 3, "clustered failures");
//! }
//! ```
//!
//! `RUNLENS_TEST_LOG_LEVEL` sets the filter (default: `debug`).

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a JSON test-writer subscriber once per test binary.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let level = std::env::var("RUNLENS_TEST_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .with(filter)
            .try_init();
    });
}
