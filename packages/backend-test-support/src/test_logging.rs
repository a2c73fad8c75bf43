//! Idempotent tracing setup for integration tests.
//!
//! Filter precedence: `TEST_LOG`, then `RUST_LOG`, then `warn`. Engine
//! internals (`backend::services::game_flow`) are noisy at `debug`, so a
//! caller that wants them has to opt in explicitly.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

pub fn init() {
    init_with_default("warn");
}

/// Same as [`init`] but with a caller-chosen fallback filter.
///
/// Only the first call in a process decides the filter.
pub fn init_with_default(default_filter: &str) {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}
