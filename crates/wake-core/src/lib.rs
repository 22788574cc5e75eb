//! # wake-core: Trait definitions for the wake primitive
//!
//! This crate defines the two seams of a wake channel:
//!
//! - [`signal::WakeSignal`]: the OS-level primitive that carries a
//!   level-triggered "something happened" signal (pipe, named FIFO,
//!   eventfd). Implementations live in `wake-module`.
//! - [`watcher::SocketWatcher`]: the event-loop / socket-watching layer
//!   that owns the blocking wait and dispatches readability callbacks.
//!   It is a collaborator, not part of the wake primitive; `wake-loop`
//!   ships a reference implementation.
//!
//! No OS code lives here. Everything that touches a descriptor is in
//! `wake-module`.
//!
//! ## Modules
//!
//! - `signal` - Wake signal backend trait
//! - `watcher` - Event-loop boundary trait and watch tokens
//! - `error` - Error taxonomy
//! - `env` - Environment variable utilities

pub mod signal;
pub mod watcher;
pub mod error;
pub mod env;

// Re-exports for convenience
pub use error::{Result, WakeError};
pub use signal::WakeSignal;
pub use watcher::{ReadCallback, SocketWatcher, WatchToken};
pub use env::{env_get, env_get_opt, env_get_str};
