//! `EventFdSignal`: kernel event counter backend (Linux).
//!
//! One eventfd serves as both ends. `signal()` adds 1 to the 64-bit
//! counter; a single 8-byte read returns the count and resets it to 0, so
//! any number of signals coalesce into one readable condition.

use crate::fd;

use wake_core::error::{Result, WakeError};
use wake_core::signal::WakeSignal;

use nix::errno::Errno;

use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

#[derive(Debug)]
pub struct EventFdSignal {
    fd: File,
}

impl EventFdSignal {
    /// Create a new eventfd. The signal OWNS the fd.
    ///
    /// Created with `EFD_NONBLOCK | EFD_CLOEXEC`: the counter read in
    /// `drain()` must not block when a readiness report was stale.
    pub fn acquire() -> Result<Self> {
        let raw = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if raw < 0 {
            return Err(WakeError::ResourceAcquisitionFailed {
                what: "eventfd",
                source: Errno::last(),
            });
        }
        // Safety: `raw` is a freshly created descriptor nobody else owns.
        let fd = unsafe { File::from_raw_fd(raw) };
        Ok(Self { fd })
    }
}

impl WakeSignal for EventFdSignal {
    fn read_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    fn signal(&self) -> Result<()> {
        // EAGAIN means the counter would overflow, which implies a signal
        // is already pending.
        fd::write_unit(&self.fd, &1u64.to_ne_bytes()).map_err(WakeError::WriteFailed)
    }

    fn drain(&self) {
        let mut buf = [0u8; 8];
        let mut file = &self.fd;
        loop {
            match file.read(&mut buf) {
                Ok(_) => return,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("eventfd: wake event confirm failed: {e}");
                    return;
                }
            }
        }
    }

    fn release(self) -> Result<()> {
        fd::close_checked(self.fd.into_raw_fd())
    }
}
