//! # wake-module: Default wake primitive implementations
//!
//! Concrete `WakeSignal` backends plus the `WakeEvent` channel that
//! registers one of them with an external event loop.
//!
//! ## Backends
//!
//! | Backend   | Impl            | Descriptors          | Write failure recovery          | Cross-process |
//! |-----------|-----------------|----------------------|---------------------------------|---------------|
//! | `pipe`    | `PipeSignal`    | pipe(2), both ends   | none beyond WouldBlock          | no            |
//! | `fifo`    | `FifoSignal`    | mkfifo + open twice  | reopen write side, retry once   | same host     |
//! | `eventfd` | `EventFdSignal` | one eventfd          | none beyond WouldBlock          | no            |
//!
//! The default backend is a build-time choice (see `config`); `AnySignal`
//! lets a `WakeConfig` pick any supported backend at runtime.

mod fd;
pub mod config;
pub mod pipe_signal;
pub mod fifo_signal;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod eventfd_signal;
pub mod backend;
pub mod wake_event;

#[cfg(test)]
mod test_util;

pub use backend::AnySignal;
pub use config::{BackendKind, WakeConfig, DEFAULT_FIFO_PATH};
pub use wake_event::{WakeEvent, WakeNotifier};
pub use wake_core::signal::WakeSignal;
