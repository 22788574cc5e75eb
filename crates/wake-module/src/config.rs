//! Wake channel configuration
//!
//! The backend is fixed per deployment. The build-time default comes from
//! cargo features; `WAKE_BACKEND` can override it at runtime.
//!
//! | Feature      | Default backend                         |
//! |--------------|-----------------------------------------|
//! | `fifo`       | named FIFO                              |
//! | `posix-pipe` | anonymous pipe                          |
//! | (none)       | eventfd on Linux/Android, pipe elsewhere |

use wake_core::env::{env_get_opt, env_get_str};
use wake_core::error::WakeError;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Well-known path of the named FIFO backend.
pub const DEFAULT_FIFO_PATH: &str = "/var/wake_event_fifo";

/// Environment variable selecting the backend (`pipe`, `fifo`, `eventfd`).
pub const ENV_BACKEND: &str = "WAKE_BACKEND";

/// Environment variable overriding [`DEFAULT_FIFO_PATH`].
pub const ENV_FIFO_PATH: &str = "WAKE_FIFO_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Anonymous pipe, single process.
    Pipe,
    /// Named FIFO at a well-known path, cross-process.
    Fifo,
    /// Kernel event counter (Linux eventfd).
    EventFd,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Pipe, BackendKind::Fifo, BackendKind::EventFd];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Pipe => "pipe",
            BackendKind::Fifo => "fifo",
            BackendKind::EventFd => "eventfd",
        }
    }

    /// Whether this backend can be built on the current target.
    pub fn is_supported(self) -> bool {
        match self {
            BackendKind::Pipe | BackendKind::Fifo => true,
            BackendKind::EventFd => cfg!(any(target_os = "linux", target_os = "android")),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "fifo")] {
        const BUILD_DEFAULT: BackendKind = BackendKind::Fifo;
    } else if #[cfg(all(any(target_os = "linux", target_os = "android"), not(feature = "posix-pipe")))] {
        const BUILD_DEFAULT: BackendKind = BackendKind::EventFd;
    } else {
        const BUILD_DEFAULT: BackendKind = BackendKind::Pipe;
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        BUILD_DEFAULT
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = WakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pipe" | "posix-pipe" => Ok(BackendKind::Pipe),
            "fifo" => Ok(BackendKind::Fifo),
            "eventfd" => Ok(BackendKind::EventFd),
            _ => Err(WakeError::UnknownBackend(s.to_string())),
        }
    }
}

/// Configuration for a `WakeEvent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeConfig {
    /// Which OS primitive backs the channel
    pub backend: BackendKind,

    /// FIFO path, only used by [`BackendKind::Fifo`]
    pub fifo_path: PathBuf,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            fifo_path: PathBuf::from(DEFAULT_FIFO_PATH),
        }
    }
}

impl WakeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build-time defaults overridden by `WAKE_BACKEND` / `WAKE_FIFO_PATH`.
    ///
    /// An unrecognised backend name is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(name) = env_get_opt::<String>(ENV_BACKEND) {
            match name.parse() {
                Ok(kind) => config.backend = kind,
                Err(e) => log::warn!("{ENV_BACKEND}: {e}; using {}", config.backend),
            }
        }
        config.fifo_path = PathBuf::from(env_get_str(ENV_FIFO_PATH, DEFAULT_FIFO_PATH));
        config
    }

    /// Set the backend
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = kind;
        self
    }

    /// Set the FIFO path
    pub fn fifo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fifo_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("pipe".parse::<BackendKind>().unwrap(), BackendKind::Pipe);
        assert_eq!("FIFO".parse::<BackendKind>().unwrap(), BackendKind::Fifo);
        assert_eq!(" eventfd ".parse::<BackendKind>().unwrap(), BackendKind::EventFd);
        assert_eq!(
            "socketpair".parse::<BackendKind>().unwrap_err(),
            WakeError::UnknownBackend("socketpair".into())
        );
    }

    #[test]
    fn test_backend_display_roundtrips() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_default_is_supported() {
        assert!(BackendKind::default().is_supported());
    }

    #[test]
    fn test_builder() {
        let config = WakeConfig::new().backend(BackendKind::Fifo).fifo_path("/tmp/x");
        assert_eq!(config.backend, BackendKind::Fifo);
        assert_eq!(config.fifo_path, PathBuf::from("/tmp/x"));
    }

    // Single test owns both variables so parallel tests never see a
    // half-set environment.
    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_BACKEND, "pipe");
        std::env::set_var(ENV_FIFO_PATH, "/tmp/custom_fifo");
        let config = WakeConfig::from_env();
        assert_eq!(config.backend, BackendKind::Pipe);
        assert_eq!(config.fifo_path, PathBuf::from("/tmp/custom_fifo"));

        std::env::set_var(ENV_BACKEND, "bogus");
        assert_eq!(WakeConfig::from_env().backend, BackendKind::default());

        std::env::remove_var(ENV_BACKEND);
        std::env::remove_var(ENV_FIFO_PATH);
        assert_eq!(WakeConfig::from_env(), WakeConfig::default());
    }
}
