//! `FifoSignal`: named FIFO backend.
//!
//! The FIFO lives at a well-known path so independent processes on the
//! same host can signal each other. The path is created on first use and
//! reused afterwards; existence is decided by `mkfifo(2)` itself
//! (`EEXIST` is fine), never by a check-then-create in userspace.
//!
//! The channel opens the FIFO twice: read-only and write-only, both
//! non-blocking. The reader is opened first so the non-blocking
//! write-only open finds a reader and does not fail with `ENXIO`.
//!
//! If a write on the long-lived writer fails for any reason other than
//! `WouldBlock`, `signal()` opens a fresh write-only handle on the same
//! path and retries exactly once.

use crate::fd;

use wake_core::error::{Result, WakeError};
use wake_core::signal::WakeSignal;

use nix::errno::Errno;
use nix::sys::stat::Mode;

use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

/// Permissions requested for a freshly created FIFO (subject to umask).
const FIFO_MODE: u32 = 0o666;

#[derive(Debug)]
pub struct FifoSignal {
    path: PathBuf,
    reader: File,
    writer: File,
}

impl FifoSignal {
    /// Create `path` as a FIFO if absent, then open both ends.
    pub fn acquire(path: &Path) -> Result<Self> {
        ensure_fifo(path)?;

        let reader = open_fifo(path, false).map_err(|source| {
            WakeError::ResourceAcquisitionFailed { what: "fifo reader", source }
        })?;
        let writer = open_fifo(path, true).map_err(|source| {
            WakeError::ResourceAcquisitionFailed { what: "fifo writer", source }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_fd(&self) -> RawFd {
        self.writer.as_raw_fd()
    }

    /// Fallback path: one write through a transient handle.
    fn signal_reopened(&self) -> Result<()> {
        let writer = open_fifo(&self.path, true).map_err(|e| {
            log::error!("fifo {}: notify failed to reopen: {e}", self.path.display());
            WakeError::WriteFailed(e)
        })?;
        fd::write_unit(&writer, &[1]).map_err(|e| {
            log::error!("fifo {}: notify failed on reopened handle: {e}", self.path.display());
            WakeError::WriteFailed(e)
        })
        // transient `writer` closes here
    }
}

impl WakeSignal for FifoSignal {
    fn read_fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }

    fn signal(&self) -> Result<()> {
        match fd::write_unit(&self.writer, &[1]) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!(
                    "fifo {}: write failed ({e}), retrying on a fresh handle",
                    self.path.display()
                );
                self.signal_reopened()
            }
        }
    }

    fn drain(&self) {
        fd::drain_stream(&self.reader, "fifo");
    }

    fn release(self) -> Result<()> {
        let read = fd::close_checked(self.reader.into_raw_fd());
        let write = fd::close_checked(self.writer.into_raw_fd());
        read.and(write)
    }
}

/// mkfifo, tolerating an existing FIFO but not an existing non-FIFO.
fn ensure_fifo(path: &Path) -> Result<()> {
    match nix::unistd::mkfifo(path, Mode::from_bits_truncate(FIFO_MODE as _)) {
        Ok(()) => Ok(()),
        Err(Errno::EEXIST) => {
            let is_fifo = std::fs::metadata(path)
                .map(|m| m.file_type().is_fifo())
                .map_err(|e| WakeError::ResourceAcquisitionFailed {
                    what: "fifo",
                    source: fd::errno_of(&e),
                })?;
            if is_fifo {
                Ok(())
            } else {
                log::error!("{} exists and is not a fifo", path.display());
                Err(WakeError::ResourceAcquisitionFailed { what: "fifo", source: Errno::EEXIST })
            }
        }
        Err(source) => Err(WakeError::ResourceAcquisitionFailed { what: "fifo", source }),
    }
}

fn open_fifo(path: &Path, write: bool) -> std::result::Result<File, Errno> {
    let mut opts = OpenOptions::new();
    if write {
        opts.write(true);
    } else {
        opts.read(true);
    }
    opts.custom_flags(libc::O_NONBLOCK | libc::O_CLOEXEC)
        .open(path)
        .map_err(|e| fd::errno_of(&e))
}
