//! `AnySignal`: the backend picked once per channel.
//!
//! A tagged variant over the concrete signals, so `WakeEvent` composes the
//! backend at runtime from a `WakeConfig` instead of being generic over it.

use crate::config::{BackendKind, WakeConfig};
use crate::fifo_signal::FifoSignal;
use crate::pipe_signal::PipeSignal;

#[cfg(any(target_os = "linux", target_os = "android"))]
use crate::eventfd_signal::EventFdSignal;

use wake_core::error::Result;
use wake_core::signal::WakeSignal;

use std::os::unix::io::RawFd;

#[derive(Debug)]
pub enum AnySignal {
    Pipe(PipeSignal),
    Fifo(FifoSignal),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    EventFd(EventFdSignal),
}

impl AnySignal {
    /// Acquire the descriptors for `config.backend`.
    pub fn acquire(config: &WakeConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Pipe => PipeSignal::acquire().map(AnySignal::Pipe),
            BackendKind::Fifo => FifoSignal::acquire(&config.fifo_path).map(AnySignal::Fifo),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            BackendKind::EventFd => EventFdSignal::acquire().map(AnySignal::EventFd),
            #[cfg(not(any(target_os = "linux", target_os = "android")))]
            BackendKind::EventFd => Err(wake_core::error::WakeError::ResourceAcquisitionFailed {
                what: "eventfd",
                source: nix::errno::Errno::ENOSYS,
            }),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            AnySignal::Pipe(_) => BackendKind::Pipe,
            AnySignal::Fifo(_) => BackendKind::Fifo,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            AnySignal::EventFd(_) => BackendKind::EventFd,
        }
    }

    /// Write-side descriptor. `None` for eventfd, which has a single
    /// bidirectional descriptor.
    pub fn write_fd(&self) -> Option<RawFd> {
        match self {
            AnySignal::Pipe(s) => Some(s.write_fd()),
            AnySignal::Fifo(s) => Some(s.write_fd()),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            AnySignal::EventFd(_) => None,
        }
    }
}

impl WakeSignal for AnySignal {
    fn read_fd(&self) -> RawFd {
        match self {
            AnySignal::Pipe(s) => s.read_fd(),
            AnySignal::Fifo(s) => s.read_fd(),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            AnySignal::EventFd(s) => s.read_fd(),
        }
    }

    fn signal(&self) -> Result<()> {
        match self {
            AnySignal::Pipe(s) => s.signal(),
            AnySignal::Fifo(s) => s.signal(),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            AnySignal::EventFd(s) => s.signal(),
        }
    }

    fn drain(&self) {
        match self {
            AnySignal::Pipe(s) => s.drain(),
            AnySignal::Fifo(s) => s.drain(),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            AnySignal::EventFd(s) => s.drain(),
        }
    }

    fn release(self) -> Result<()> {
        match self {
            AnySignal::Pipe(s) => s.release(),
            AnySignal::Fifo(s) => s.release(),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            AnySignal::EventFd(s) => s.release(),
        }
    }
}
