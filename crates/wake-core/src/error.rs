//! Wake channel error types.

use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WakeError {
    /// pipe / mkfifo / open / eventfd failed.
    #[error("open failed: cannot acquire {what}: {source}")]
    ResourceAcquisitionFailed {
        what: &'static str,
        #[source]
        source: Errno,
    },
    /// fcntl(O_NONBLOCK) failed.
    #[error("open failed: cannot set non-blocking mode: {0}")]
    ModeConfigurationFailed(#[source] Errno),
    /// The event loop refused the watch or callback.
    #[error("open failed: event loop registration: {0}")]
    RegistrationFailed(#[source] Errno),
    /// Notify failed after any backend fallback.
    #[error("wake notify failed: {0}")]
    WriteFailed(#[source] Errno),
    /// close(2) reported failure. Treated as fatal by the channel.
    #[error("wake descriptor close failed: {0}")]
    CloseFailed(#[source] Errno),
    #[error("wake event is not open")]
    NotOpen,
    #[error("wake event is already open")]
    AlreadyOpen,
    #[error("unknown wake backend {0:?} (expected pipe, fifo or eventfd)")]
    UnknownBackend(String),
}

impl WakeError {
    /// Underlying OS error code, if any.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::ResourceAcquisitionFailed { source, .. } => Some(*source),
            Self::ModeConfigurationFailed(e)
            | Self::RegistrationFailed(e)
            | Self::WriteFailed(e)
            | Self::CloseFailed(e) => Some(*e),
            Self::NotOpen | Self::AlreadyOpen | Self::UnknownBackend(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = WakeError::ResourceAcquisitionFailed { what: "pipe", source: Errno::EMFILE };
        assert!(format!("{}", e).starts_with("open failed: cannot acquire pipe"));

        let e = WakeError::RegistrationFailed(Errno::EBADF);
        assert!(format!("{}", e).starts_with("open failed: event loop registration"));

        assert_eq!(format!("{}", WakeError::NotOpen), "wake event is not open");
    }

    #[test]
    fn test_errno_accessor() {
        assert_eq!(WakeError::WriteFailed(Errno::EPIPE).errno(), Some(Errno::EPIPE));
        assert_eq!(WakeError::CloseFailed(Errno::EIO).errno(), Some(Errno::EIO));
        assert_eq!(WakeError::AlreadyOpen.errno(), None);
        assert_eq!(WakeError::UnknownBackend("x".into()).errno(), None);
    }
}
