//! Logging for unit tests, installed once per test binary by the `ctor`
//! hook in `lib.rs`.
//!
//! Uses the same filter precedence as the integration tests (`TEST_LOG`,
//! then `RUST_LOG`, then `warn`), so `TEST_LOG=backend=debug` shows engine
//! events from either kind of test.

pub fn init() {
    backend_test_support::test_logging::init();
}
