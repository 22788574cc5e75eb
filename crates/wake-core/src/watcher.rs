//! Event-loop boundary.
//!
//! The wake channel does not run a loop of its own. It hands its read
//! descriptor to whatever owns the blocking `select`/`poll`/`epoll` wait
//! and asks to be called back when that descriptor turns readable.

use std::fmt;
use std::os::unix::io::RawFd;

/// Callback run by the event loop, on the loop thread, when a watched
/// descriptor is readable.
pub type ReadCallback = Box<dyn FnMut() + Send + 'static>;

/// Opaque handle for one active registration in a `SocketWatcher`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchToken(pub u32);

impl WatchToken {
    /// Sentinel for "not registered".
    pub const INVALID: WatchToken = WatchToken(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for WatchToken {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for WatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "WatchToken({})", self.0)
        } else {
            write!(f, "WatchToken(INVALID)")
        }
    }
}

/// Socket-watching service that owns the wait loop.
///
/// All methods are called from the thread that owns the loop. Failures
/// are reported as raw OS error codes; callers wrap them.
pub trait SocketWatcher {
    /// Begin watching `fd` for readability.
    fn start_watching_socket(&mut self, fd: RawFd) -> nix::Result<WatchToken>;

    /// Install the callback for an active watch, replacing any previous one.
    fn set_callback(&mut self, watch: WatchToken, callback: ReadCallback) -> nix::Result<()>;

    /// Make sure data that is already pending on the descriptor gets a
    /// callback on the next loop iteration, even without a fresh OS event.
    fn request_callback_on_pending_read(&mut self, watch: WatchToken) -> nix::Result<()>;

    /// Stop watching and drop the callback. Resets `watch` to
    /// [`WatchToken::INVALID`]. Stopping an invalid token is a no-op.
    fn stop_watching_socket(&mut self, watch: &mut WatchToken);
}
