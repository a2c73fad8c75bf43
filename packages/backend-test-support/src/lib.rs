//! Shared helpers for backend integration tests.

pub mod test_logging;
