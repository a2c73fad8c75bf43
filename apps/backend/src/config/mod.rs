//! Process configuration, read once from the environment at startup.

pub mod game;
pub mod server;

pub use game::{AiTiming, GameConfig};
pub use server::{ProviderKeys, ServerConfig};

use std::str::FromStr;

use crate::error::AppError;

/// Parse `key` through `lookup`, falling back to `default` when unset.
///
/// A value that is present but unparsable is a configuration error rather
/// than a silent fallback.
pub(crate) fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::config(format!("{key}={raw:?}: {e}"))),
    }
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
