//! # WakeEvent: interrupt a blocking wait from any thread
//!
//! A `WakeEvent` owns one backend signal and registers its read side with
//! an external [`SocketWatcher`]. Producers call [`WakeEvent::notify`] (or
//! a detached [`WakeNotifier`]); the loop thread's readability callback
//! runs `confirm`, which drains the signal so the next wait blocks again.
//!
//! ```text
//!  producer thread(s)              event-loop thread
//!  ──────────────────              ─────────────────
//!  notify() ── write 1 unit ──►  [read fd readable]
//!                                 wait() returns
//!                                 callback → confirm() ── drain all
//!                                 wait() blocks again
//! ```
//!
//! ## Lifecycle
//!
//! `new` → closed. `open` acquires descriptors and registers; on any
//! failure everything acquired so far is released before returning, and
//! the channel stays closed. `close` deregisters, then closes every
//! descriptor; a close failure aborts the process.
//!
//! ## Ownership
//!
//! The signal sits behind an `Arc`. The channel holds the strong
//! reference, the installed callback holds a second one for as long as
//! the watcher keeps it, and notifiers hold only `Weak` references. Once
//! the watcher has dropped the callback on `stop_watching_socket`, the
//! channel is the sole owner and releases the descriptors explicitly.

use crate::backend::AnySignal;
use crate::config::{BackendKind, WakeConfig};

use wake_core::error::{Result, WakeError};
use wake_core::signal::WakeSignal;
use wake_core::watcher::{SocketWatcher, WatchToken};

use std::os::unix::io::RawFd;
use std::sync::{Arc, Weak};

pub struct WakeEvent {
    config: WakeConfig,
    signal: Option<Arc<AnySignal>>,
    watch: WatchToken,
}

impl WakeEvent {
    /// A closed channel that will use `config` when opened.
    pub fn new(config: WakeConfig) -> Self {
        Self {
            config,
            signal: None,
            watch: WatchToken::INVALID,
        }
    }

    pub fn config(&self) -> &WakeConfig {
        &self.config
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.signal.is_some()
    }

    /// Backend of the open channel.
    pub fn kind(&self) -> Option<BackendKind> {
        self.signal.as_ref().map(|s| s.kind())
    }

    /// Descriptor registered with the loop, while open.
    pub fn read_fd(&self) -> Option<RawFd> {
        self.signal.as_ref().map(|s| s.read_fd())
    }

    pub fn watch(&self) -> WatchToken {
        self.watch
    }

    /// Acquire the backend descriptors and register with `watcher`.
    ///
    /// Steps: acquire (and set non-blocking), start watching the read
    /// side, install `confirm` as the readability callback, request a
    /// callback for data that is already pending.
    pub fn open<W>(&mut self, watcher: &mut W) -> Result<()>
    where
        W: SocketWatcher + ?Sized,
    {
        if self.is_open() {
            return Err(WakeError::AlreadyOpen);
        }

        let signal = Arc::new(AnySignal::acquire(&self.config)?);
        // From here on, an early return drops `signal` and closes the
        // descriptors.

        let mut watch = watcher
            .start_watching_socket(signal.read_fd())
            .map_err(WakeError::RegistrationFailed)?;

        let ctx = Arc::clone(&signal);
        let registered = watcher
            .set_callback(watch, Box::new(move || ctx.drain()))
            .and_then(|()| watcher.request_callback_on_pending_read(watch));

        if let Err(e) = registered {
            watcher.stop_watching_socket(&mut watch);
            log::debug!("wake event ({}): registration failed: {e}", self.config.backend);
            return Err(WakeError::RegistrationFailed(e));
        }

        log::debug!(
            "wake event ({}): open, read fd {} watch {:?}",
            signal.kind(),
            signal.read_fd(),
            watch
        );
        self.signal = Some(signal);
        self.watch = watch;
        Ok(())
    }

    /// Deregister from `watcher` and close every descriptor.
    ///
    /// Closing an already-closed channel does nothing.
    ///
    /// # Panics
    ///
    /// Never returns if close(2) fails: the process is aborted.
    pub fn close<W>(&mut self, watcher: &mut W)
    where
        W: SocketWatcher + ?Sized,
    {
        let Some(signal) = self.signal.take() else {
            return;
        };

        watcher.stop_watching_socket(&mut self.watch);
        self.watch = WatchToken::INVALID;

        let kind = signal.kind();
        match Arc::try_unwrap(signal) {
            Ok(signal) => {
                if let Err(e) = signal.release() {
                    log::error!("wake event ({kind}): {e}");
                    std::process::abort();
                }
                log::debug!("wake event ({kind}): closed");
            }
            Err(shared) => {
                // Watcher kept the callback, or a notifier is mid-write.
                // The last holder's drop closes the descriptors.
                log::warn!(
                    "wake event ({kind}): descriptors still referenced ({} holders), deferring release",
                    Arc::strong_count(&shared)
                );
            }
        }
    }

    /// Raise the wake signal. Never blocks.
    ///
    /// A full buffer or saturated counter is success: a wake is already
    /// pending and the next confirm will see it.
    pub fn notify(&self) -> Result<()> {
        self.signal.as_ref().ok_or(WakeError::NotOpen)?.signal()
    }

    /// Drain all pending signal state. This is what the registered
    /// callback runs; embedders dispatching readiness themselves may call
    /// it directly, on the loop thread only.
    pub fn confirm(&self) {
        if let Some(signal) = &self.signal {
            signal.drain();
        }
    }

    /// A cloneable producer handle for other threads.
    ///
    /// The handle does not keep the channel open: after `close` its
    /// `notify` returns [`WakeError::NotOpen`].
    pub fn notifier(&self) -> Option<WakeNotifier> {
        self.signal.as_ref().map(|s| WakeNotifier {
            signal: Arc::downgrade(s),
        })
    }
}

impl std::fmt::Debug for WakeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeEvent")
            .field("backend", &self.config.backend)
            .field("open", &self.is_open())
            .field("read_fd", &self.read_fd())
            .field("watch", &self.watch)
            .finish()
    }
}

impl Drop for WakeEvent {
    fn drop(&mut self) {
        if self.is_open() {
            log::warn!(
                "wake event ({}): dropped while open; watch {:?} left registered",
                self.config.backend,
                self.watch
            );
        }
    }
}

/// Detached producer side of a [`WakeEvent`].
#[derive(Clone, Debug)]
pub struct WakeNotifier {
    signal: Weak<AnySignal>,
}

impl WakeNotifier {
    /// Same semantics as [`WakeEvent::notify`].
    pub fn notify(&self) -> Result<()> {
        self.signal.upgrade().ok_or(WakeError::NotOpen)?.signal()
    }
}
