//! # wake-loop: Event loop side of the wake channel
//!
//! - [`PollLoop`]: single-threaded `poll(2)` loop implementing
//!   `SocketWatcher`, so a `WakeEvent` can register with it.
//! - [`LoopRunner`]: runs a `PollLoop` on a dedicated thread and accepts
//!   work from any thread, waking the loop through a `WakeEvent`.

pub mod config;
pub mod poll_loop;
pub mod runner;

pub use config::LoopConfig;
pub use poll_loop::PollLoop;
pub use runner::{Job, LoopRunner, RunnerError, RunnerHandle, ScheduleError};
