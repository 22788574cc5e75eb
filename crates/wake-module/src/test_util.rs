//! Test helpers: readability probe and an in-memory `SocketWatcher`.

use crate::config::{BackendKind, WakeConfig};

use wake_core::watcher::{ReadCallback, SocketWatcher, WatchToken};

use nix::errno::Errno;

use std::os::unix::io::RawFd;
use std::path::Path;

/// Zero-timeout poll(2) for POLLIN.
pub(crate) fn readable(fd: RawFd) -> bool {
    let mut pfd = libc::pollfd { fd, events: libc::POLLIN, revents: 0 };
    let n = unsafe { libc::poll(&mut pfd, 1, 0) };
    n == 1 && pfd.revents & libc::POLLIN != 0
}

/// One config per backend the target supports. FIFO paths live in `dir`.
pub(crate) fn supported_configs(dir: &Path) -> Vec<WakeConfig> {
    BackendKind::ALL
        .into_iter()
        .filter(|k| k.is_supported())
        .map(|k| WakeConfig::new().backend(k).fifo_path(dir.join("wake_fifo")))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailAt {
    Start,
    Callback,
    Pending,
}

struct Slot {
    fd: RawFd,
    callback: Option<ReadCallback>,
}

/// Records registrations and lets a test fire callbacks by hand.
#[derive(Default)]
pub(crate) struct RecordingWatcher {
    slots: Vec<Option<Slot>>,
    pub fail_at: Option<FailAt>,
    pub started: usize,
    pub stopped: usize,
    pub pending_requests: usize,
    /// Keep callbacks alive after stop, like a misbehaving loop would.
    pub leak_on_stop: bool,
    pub leaked: Vec<ReadCallback>,
}

impl RecordingWatcher {
    /// Watcher whose `at` step reports an error.
    pub fn failing(at: FailAt) -> Self {
        Self { fail_at: Some(at), ..Self::default() }
    }

    /// Watcher that keeps callbacks alive after stop.
    pub fn leaking() -> Self {
        Self { leak_on_stop: true, ..Self::default() }
    }

    pub fn active(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn watched_fd(&self, watch: WatchToken) -> Option<RawFd> {
        self.slot(watch).map(|s| s.fd)
    }

    pub fn has_callback(&self, watch: WatchToken) -> bool {
        self.slot(watch).map_or(false, |s| s.callback.is_some())
    }

    /// Run the callback as the loop would on readability.
    pub fn fire(&mut self, watch: WatchToken) {
        let slot = self
            .slots
            .get_mut(watch.index())
            .and_then(Option::as_mut)
            .expect("fire on inactive watch");
        (slot.callback.as_mut().expect("no callback installed"))();
    }

    fn slot(&self, watch: WatchToken) -> Option<&Slot> {
        self.slots.get(watch.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, watch: WatchToken) -> nix::Result<&mut Slot> {
        self.slots
            .get_mut(watch.index())
            .and_then(Option::as_mut)
            .ok_or(Errno::ENOENT)
    }
}

impl SocketWatcher for RecordingWatcher {
    fn start_watching_socket(&mut self, fd: RawFd) -> nix::Result<WatchToken> {
        if self.fail_at == Some(FailAt::Start) {
            return Err(Errno::EMFILE);
        }
        self.started += 1;
        self.slots.push(Some(Slot { fd, callback: None }));
        Ok(WatchToken((self.slots.len() - 1) as u32))
    }

    fn set_callback(&mut self, watch: WatchToken, callback: ReadCallback) -> nix::Result<()> {
        if self.fail_at == Some(FailAt::Callback) {
            return Err(Errno::EINVAL);
        }
        self.slot_mut(watch)?.callback = Some(callback);
        Ok(())
    }

    fn request_callback_on_pending_read(&mut self, watch: WatchToken) -> nix::Result<()> {
        if self.fail_at == Some(FailAt::Pending) {
            return Err(Errno::EBADF);
        }
        self.slot_mut(watch)?;
        self.pending_requests += 1;
        Ok(())
    }

    fn stop_watching_socket(&mut self, watch: &mut WatchToken) {
        if let Some(slot) = self.slots.get_mut(watch.index()).and_then(Option::take) {
            self.stopped += 1;
            if self.leak_on_stop {
                self.leaked.extend(slot.callback);
            }
        }
        *watch = WatchToken::INVALID;
    }
}
