//! Environment variable utilities
//!
//! Typed lookups with defaults, used by `WakeConfig::from_env()` and
//! `LoopConfig::from_env()`.
//!
//! # Usage
//!
//! ```ignore
//! use wake_core::env::{env_get, env_get_opt, env_get_str};
//!
//! let capacity: usize = env_get("WAKE_LOOP_QUEUE_CAPACITY", 1024);
//! let backend: Option<String> = env_get_opt("WAKE_BACKEND");
//! let path = env_get_str("WAKE_FIFO_PATH", "/var/wake_event_fifo");
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Unset and unparseable values both yield `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get environment variable as optional value
///
/// Returns `Some(T)` if the variable is set and parses successfully,
/// `None` otherwise.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Get environment variable as string, or return default
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

// ============================================================================
// Tests
// ============================================================================
