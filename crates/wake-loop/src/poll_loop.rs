//! # PollLoop: reference socket watcher over poll(2)
//!
//! A minimal single-threaded event loop: a fixed-size watch table, one
//! `poll(2)` per iteration, readability callbacks dispatched on the
//! calling thread. It implements [`SocketWatcher`] so a `WakeEvent` can
//! register with it.
//!
//! `WatchToken` = index into the watch table. Stopped slots are reused.

use crate::config::LoopConfig;

use wake_core::watcher::{ReadCallback, SocketWatcher, WatchToken};

use nix::errno::Errno;

use std::os::unix::io::RawFd;
use std::time::Duration;

struct Watch {
    fd: RawFd,
    callback: Option<ReadCallback>,
}

pub struct PollLoop {
    watches: Vec<Option<Watch>>,
    max_watches: usize,
    /// Next wait must not block (set by `request_callback_on_pending_read`).
    check_pending: bool,
    // Scratch, reused across iterations.
    pollfds: Vec<libc::pollfd>,
    tokens: Vec<WatchToken>,
    ready: Vec<WatchToken>,
}

impl PollLoop {
    pub fn new(config: &LoopConfig) -> Self {
        Self {
            watches: Vec::new(),
            max_watches: config.max_watches,
            check_pending: false,
            pollfds: Vec::with_capacity(config.max_watches),
            tokens: Vec::with_capacity(config.max_watches),
            ready: Vec::with_capacity(config.max_watches),
        }
    }

    /// Number of active watches.
    pub fn watch_count(&self) -> usize {
        self.watches.iter().filter(|w| w.is_some()).count()
    }

    pub fn is_watching(&self, watch: WatchToken) -> bool {
        self.watches.get(watch.index()).map_or(false, Option::is_some)
    }

    /// Block until a watched descriptor is readable or `timeout` elapses
    /// (`None` = no timeout). Returns how many watches are ready; they are
    /// kept for the next `dispatch`.
    ///
    /// An interrupted wait (`EINTR`) reports 0 ready.
    pub fn wait(&mut self, timeout: Option<Duration>) -> nix::Result<usize> {
        self.pollfds.clear();
        self.tokens.clear();
        self.ready.clear();

        for (i, w) in self.watches.iter().enumerate() {
            if let Some(w) = w {
                self.pollfds.push(libc::pollfd { fd: w.fd, events: libc::POLLIN, revents: 0 });
                self.tokens.push(WatchToken(i as u32));
            }
        }

        let timeout_ms = if std::mem::take(&mut self.check_pending) {
            0
        } else {
            poll_timeout_ms(timeout)
        };

        let n = unsafe {
            libc::poll(self.pollfds.as_mut_ptr(), self.pollfds.len() as libc::nfds_t, timeout_ms)
        };
        if n < 0 {
            return match Errno::last() {
                Errno::EINTR => Ok(0),
                e => Err(e),
            };
        }

        for (pfd, token) in self.pollfds.iter().zip(&self.tokens) {
            if pfd.revents & libc::POLLNVAL != 0 {
                log::warn!("poll loop: watch {token:?} fd {} is not open", pfd.fd);
                continue;
            }
            if pfd.revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0 {
                self.ready.push(*token);
            }
        }
        Ok(self.ready.len())
    }

    /// Run the callbacks of the watches found ready by the last `wait`.
    /// Returns how many callbacks ran.
    pub fn dispatch(&mut self) -> usize {
        let mut ran = 0;
        for token in std::mem::take(&mut self.ready) {
            let callback = self
                .watches
                .get_mut(token.index())
                .and_then(Option::as_mut)
                .and_then(|w| w.callback.as_mut());
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// One loop iteration: `wait` then `dispatch`.
    pub fn run_once(&mut self, timeout: Option<Duration>) -> nix::Result<usize> {
        self.wait(timeout)?;
        Ok(self.dispatch())
    }

    fn watch_mut(&mut self, watch: WatchToken) -> nix::Result<&mut Watch> {
        self.watches
            .get_mut(watch.index())
            .and_then(Option::as_mut)
            .ok_or(Errno::ENOENT)
    }
}

/// poll(2) timeout argument. Rounds up so a sub-millisecond timeout still
/// blocks instead of spinning.
fn poll_timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(d) => d.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as libc::c_int,
    }
}

impl SocketWatcher for PollLoop {
    fn start_watching_socket(&mut self, fd: RawFd) -> nix::Result<WatchToken> {
        if fd < 0 {
            return Err(Errno::EBADF);
        }
        let watch = Watch { fd, callback: None };
        if let Some(i) = self.watches.iter().position(Option::is_none) {
            self.watches[i] = Some(watch);
            return Ok(WatchToken(i as u32));
        }
        if self.watches.len() >= self.max_watches {
            return Err(Errno::EMFILE);
        }
        self.watches.push(Some(watch));
        Ok(WatchToken((self.watches.len() - 1) as u32))
    }

    fn set_callback(&mut self, watch: WatchToken, callback: ReadCallback) -> nix::Result<()> {
        self.watch_mut(watch)?.callback = Some(callback);
        Ok(())
    }

    fn request_callback_on_pending_read(&mut self, watch: WatchToken) -> nix::Result<()> {
        self.watch_mut(watch)?;
        self.check_pending = true;
        Ok(())
    }

    fn stop_watching_socket(&mut self, watch: &mut WatchToken) {
        if let Some(slot) = self.watches.get_mut(watch.index()) {
            *slot = None;
        }
        let stopped = *watch;
        self.ready.retain(|t| *t != stopped);
        *watch = WatchToken::INVALID;
    }
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("watches", &self.watch_count())
            .field("max_watches", &self.max_watches)
            .field("check_pending", &self.check_pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::io::AsRawFd;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pipe() -> (std::os::fd::OwnedFd, std::os::fd::OwnedFd) {
        nix::unistd::pipe().unwrap()
    }

    #[test]
    fn test_timeout_without_events() {
        let (r, _w) = pipe();
        let mut lp = PollLoop::new(&LoopConfig::default());
        lp.start_watching_socket(r.as_raw_fd()).unwrap();
        assert_eq!(lp.wait(Some(Duration::from_millis(10))).unwrap(), 0);
    }

    #[test]
    fn test_timeout_rounds_up() {
        assert_eq!(poll_timeout_ms(None), -1);
        assert_eq!(poll_timeout_ms(Some(Duration::ZERO)), 0);
        assert_eq!(poll_timeout_ms(Some(Duration::from_micros(500))), 1);
        assert_eq!(poll_timeout_ms(Some(Duration::from_millis(20))), 20);
        assert_eq!(poll_timeout_ms(Some(Duration::from_secs(u64::MAX))), i32::MAX);
    }

    #[test]
    fn test_sub_millisecond_wait_blocks() {
        let (r, _w) = pipe();
        let mut lp = PollLoop::new(&LoopConfig::default());
        lp.start_watching_socket(r.as_raw_fd()).unwrap();
        let start = std::time::Instant::now();
        assert_eq!(lp.wait(Some(Duration::from_micros(500))).unwrap(), 0);
        assert!(start.elapsed() >= Duration::from_micros(500));
    }

    #[test]
    fn test_dispatch_readable() {
        let (r, w) = pipe();
        let hits = Arc::new(AtomicUsize::new(0));
        let mut lp = PollLoop::new(&LoopConfig::default());
        let token = lp.start_watching_socket(r.as_raw_fd()).unwrap();
        let h = hits.clone();
        lp.set_callback(token, Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

        nix::unistd::write(&w, &[1]).unwrap();
        assert_eq!(lp.run_once(Some(Duration::from_secs(1))).unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ready_without_callback_not_dispatched() {
        let (r, w) = pipe();
        let mut lp = PollLoop::new(&LoopConfig::default());
        lp.start_watching_socket(r.as_raw_fd()).unwrap();
        nix::unistd::write(&w, &[1]).unwrap();
        assert_eq!(lp.wait(Some(Duration::from_secs(1))).unwrap(), 1);
        assert_eq!(lp.dispatch(), 0);
    }

    #[test]
    fn test_pending_request_forces_nonblocking_wait() {
        let (r, _w) = pipe();
        let mut lp = PollLoop::new(&LoopConfig::default());
        let token = lp.start_watching_socket(r.as_raw_fd()).unwrap();
        lp.request_callback_on_pending_read(token).unwrap();

        let start = std::time::Instant::now();
        assert_eq!(lp.wait(None).unwrap(), 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_stop_frees_slot() {
        let (r, _w) = pipe();
        let mut lp = PollLoop::new(&LoopConfig::default());
        let mut token = lp.start_watching_socket(r.as_raw_fd()).unwrap();
        assert!(lp.is_watching(token));
        lp.stop_watching_socket(&mut token);
        assert_eq!(token, WatchToken::INVALID);
        assert_eq!(lp.watch_count(), 0);

        let reused = lp.start_watching_socket(r.as_raw_fd()).unwrap();
        assert_eq!(reused, WatchToken(0));
        // Stopping an invalid token is a no-op.
        lp.stop_watching_socket(&mut token);
        assert_eq!(lp.watch_count(), 1);
    }

    #[test]
    fn test_table_full() {
        let (r, _w) = pipe();
        let mut lp = PollLoop::new(&LoopConfig::new().max_watches(2));
        lp.start_watching_socket(r.as_raw_fd()).unwrap();
        lp.start_watching_socket(r.as_raw_fd()).unwrap();
        assert_eq!(lp.start_watching_socket(r.as_raw_fd()), Err(Errno::EMFILE));
    }

    #[test]
    fn test_bad_registration() {
        let mut lp = PollLoop::new(&LoopConfig::default());
        assert_eq!(lp.start_watching_socket(-1), Err(Errno::EBADF));
        assert_eq!(lp.set_callback(WatchToken(5), Box::new(|| {})), Err(Errno::ENOENT));
        assert_eq!(lp.request_callback_on_pending_read(WatchToken::INVALID), Err(Errno::ENOENT));
    }
}
