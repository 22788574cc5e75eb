//! Event loop configuration

use wake_core::env::env_get;

/// Default watch table size.
pub const DEFAULT_MAX_WATCHES: usize = 64;

/// Default capacity of the `LoopRunner` job queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Configuration for `PollLoop` and `LoopRunner`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Maximum concurrent watches in one `PollLoop`
    pub max_watches: usize,

    /// Job queue capacity (lock-free, fixed size)
    pub queue_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_watches: DEFAULT_MAX_WATCHES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl LoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `WAKE_LOOP_MAX_WATCHES` / `WAKE_LOOP_QUEUE_CAPACITY`
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_watches: env_get("WAKE_LOOP_MAX_WATCHES", d.max_watches),
            queue_capacity: env_get("WAKE_LOOP_QUEUE_CAPACITY", d.queue_capacity),
        }
    }

    /// Set watch table size
    pub fn max_watches(mut self, n: usize) -> Self {
        self.max_watches = n;
        self
    }

    /// Set job queue capacity
    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.queue_capacity = n;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_watches == 0 {
            return Err("max_watches must be at least 1");
        }
        if self.max_watches > u32::MAX as usize - 1 {
            return Err("max_watches exceeds token space");
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1");
        }
        Ok(())
    }
}
