//! Descriptor provisioning helpers shared by the backends.

use wake_core::error::{Result, WakeError};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::RawFd;

/// Scratch size for draining byte-stream backends.
pub(crate) const DRAIN_CHUNK: usize = 128;

/// OR `O_NONBLOCK` into the descriptor's status flags.
pub(crate) fn set_nonblocking(fd: RawFd) -> Result<()> {
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(WakeError::ModeConfigurationFailed)?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(WakeError::ModeConfigurationFailed)?;
    Ok(())
}

/// close(2) that reports failure instead of swallowing it.
///
/// The caller hands over ownership: `fd` is invalid afterwards whatever
/// the outcome.
pub(crate) fn close_checked(fd: RawFd) -> Result<()> {
    nix::unistd::close(fd).map_err(WakeError::CloseFailed)
}

#[inline]
pub(crate) fn errno_of(err: &io::Error) -> Errno {
    err.raw_os_error().map(Errno::from_raw).unwrap_or(Errno::EIO)
}

/// One non-blocking write of `unit`.
///
/// `WouldBlock` is success: the buffer (or counter) already holds a
/// pending signal the consumer has not drained yet.
pub(crate) fn write_unit(file: &File, unit: &[u8]) -> std::result::Result<(), Errno> {
    let mut file = file;
    loop {
        match file.write(unit) {
            Ok(_) => return Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(errno_of(&e)),
        }
    }
}

/// Read a byte stream until it is empty.
///
/// Stops on a short read, on `WouldBlock`, or on any other error (logged).
/// Returns the number of bytes consumed.
pub(crate) fn drain_stream(file: &File, label: &str) -> usize {
    let mut file = file;
    let mut buf = [0u8; DRAIN_CHUNK];
    let mut total = 0;
    loop {
        match file.read(&mut buf) {
            Ok(n) => {
                total += n;
                if n < buf.len() {
                    break;
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::error!("{label}: wake event confirm failed: {e}");
                break;
            }
        }
    }
    total
}
