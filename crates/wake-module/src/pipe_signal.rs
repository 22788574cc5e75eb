//! `PipeSignal`: anonymous pipe backend.
//!
//! One byte written per signal, drained in 128-byte chunks. Both ends are
//! non-blocking, so a full pipe on write means a wake is already pending.
//! Single process only: nobody else can reach the descriptors.

use crate::fd;

use wake_core::error::{Result, WakeError};
use wake_core::signal::WakeSignal;

use std::fs::File;
use std::os::fd::OwnedFd;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};

#[derive(Debug)]
pub struct PipeSignal {
    reader: File,
    writer: File,
}

impl PipeSignal {
    /// Create the pipe and put both ends into non-blocking mode.
    ///
    /// On failure the ends that were already created are closed before
    /// returning.
    pub fn acquire() -> Result<Self> {
        let (reader, writer) = cloexec_pipe()
            .map_err(|source| WakeError::ResourceAcquisitionFailed { what: "pipe", source })?;

        fd::set_nonblocking(reader.as_raw_fd())?;
        fd::set_nonblocking(writer.as_raw_fd())?;

        Ok(Self {
            reader: File::from(reader),
            writer: File::from(writer),
        })
    }

    pub fn write_fd(&self) -> RawFd {
        self.writer.as_raw_fd()
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "macos", target_os = "ios"))] {
        // No pipe2(2): set FD_CLOEXEC right after creation.
        fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
            use nix::fcntl::{fcntl, FcntlArg, FdFlag};

            let (reader, writer) = nix::unistd::pipe()?;
            for end in [&reader, &writer] {
                fcntl(end.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
            }
            Ok((reader, writer))
        }
    } else {
        fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
            nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
        }
    }
}

impl WakeSignal for PipeSignal {
    fn read_fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }

    fn signal(&self) -> Result<()> {
        fd::write_unit(&self.writer, &[1]).map_err(WakeError::WriteFailed)
    }

    fn drain(&self) {
        fd::drain_stream(&self.reader, "pipe");
    }

    fn release(self) -> Result<()> {
        let read = fd::close_checked(self.reader.into_raw_fd());
        let write = fd::close_checked(self.writer.into_raw_fd());
        read.and(write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::readable;

    #[test]
    fn test_signal_then_drain() {
        let sig = PipeSignal::acquire().unwrap();
        assert!(!readable(sig.read_fd()));

        sig.signal().unwrap();
        assert!(readable(sig.read_fd()));

        sig.drain();
        assert!(!readable(sig.read_fd()));
        sig.release().unwrap();
    }

    #[test]
    fn test_signals_coalesce() {
        let sig = PipeSignal::acquire().unwrap();
        for _ in 0..5 {
            sig.signal().unwrap();
        }
        assert!(readable(sig.read_fd()));
        sig.drain();
        assert!(!readable(sig.read_fd()));
        // Second drain with nothing pending has no effect.
        sig.drain();
        assert!(!readable(sig.read_fd()));
        sig.release().unwrap();
    }

    #[test]
    fn test_signal_never_blocks_when_full() {
        let sig = PipeSignal::acquire().unwrap();
        // Far beyond the default 64 KiB pipe capacity.
        for _ in 0..200_000 {
            sig.signal().unwrap();
        }
        sig.drain();
        assert!(!readable(sig.read_fd()));
        sig.release().unwrap();
    }

    #[test]
    fn test_ends_close_on_exec() {
        use nix::fcntl::{fcntl, FcntlArg, FdFlag};

        let sig = PipeSignal::acquire().unwrap();
        for fd in [sig.read_fd(), sig.write_fd()] {
            let flags = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).unwrap());
            assert!(flags.contains(FdFlag::FD_CLOEXEC), "fd {fd} lacks FD_CLOEXEC");
        }
        sig.release().unwrap();
    }

    #[test]
    fn test_drain_error_is_swallowed() {
        let sig = PipeSignal::acquire().unwrap();
        sig.signal().unwrap();
        // Read side now refers to a write-only handle: read(2) fails EBADF.
        let wo = std::fs::OpenOptions::new().write(true).open("/dev/null").unwrap();
        nix::unistd::dup2(wo.as_raw_fd(), sig.read_fd()).unwrap();
        sig.drain();
        sig.drain();
        sig.release().unwrap();
    }

    #[test]
    fn test_distinct_ends() {
        let sig = PipeSignal::acquire().unwrap();
        assert_ne!(sig.read_fd(), sig.write_fd());
        sig.release().unwrap();
    }
}
