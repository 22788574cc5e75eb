//! Wake signal abstraction.
//!
//! A `WakeSignal` owns the descriptor(s) behind a wake channel and knows
//! how to raise and clear the readable condition on them.
//!
//! # Implementors
//!
//! - `PipeSignal`: anonymous pipe, one byte per signal. Single process.
//! - `FifoSignal`: well-known named FIFO opened twice. Any process on the
//!   same host that opens the same path can signal.
//! - `EventFdSignal` (Linux): one eventfd, 64-bit counter writes of 1.

use crate::error::Result;

use std::os::unix::io::RawFd;

/// Level-triggered wake signal over OS descriptors.
///
/// **Contract:**
/// - `signal()` must NEVER block. A full buffer / saturated counter means
///   a signal is already pending and counts as success.
/// - Any number of `signal()` calls before a `drain()` coalesce into one
///   readable condition on `read_fd()`.
/// - `drain()` is exhaustive: afterwards `read_fd()` is not readable
///   unless a new `signal()` raced in.
/// - `drain()` never fails outward. Errors are logged and the drain stops.
/// - `release()` closes every owned descriptor exactly once.
pub trait WakeSignal: Send + Sync {
    /// Descriptor to register for readability with the event loop.
    fn read_fd(&self) -> RawFd;

    /// Write one unit (a byte, or a counter increment of 1).
    fn signal(&self) -> Result<()>;

    /// Consume all pending signal state.
    fn drain(&self);

    /// Close the owned descriptors, reporting the first close failure.
    fn release(self) -> Result<()>
    where
        Self: Sized;
}
