//! # LoopRunner: dedicated event-loop thread with a wakeable job queue
//!
//! The runner owns a `PollLoop` and a `WakeEvent` registered with it, both
//! moved onto a dedicated OS thread. Other threads hand work to the loop
//! through a lock-free `ArrayQueue` and then notify the wake event, which
//! interrupts the loop's blocking `poll(2)`:
//!
//! ```text
//!  any thread                         wake-loop thread
//!  ──────────                         ────────────────
//!  schedule(job)
//!    queue.push(job)
//!    notifier.notify() ──────────►   poll() returns (wake fd readable)
//!                                     callback: confirm() drains
//!                                     pop + run every queued job
//!                                     poll() blocks again
//! ```
//!
//! Jobs are pushed before the notify and popped after the confirm, so a
//! job is never stranded behind a drained signal.

use crate::config::LoopConfig;
use crate::poll_loop::PollLoop;

use wake_core::error::WakeError;
use wake_module::{WakeConfig, WakeEvent, WakeNotifier};

use crossbeam_queue::ArrayQueue;
use thiserror::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Unit of work run on the loop thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid loop config: {0}")]
    Config(&'static str),
    #[error(transparent)]
    Wake(#[from] WakeError),
    #[error("cannot spawn event loop thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("job queue full")]
    QueueFull,
    #[error("event loop is shut down")]
    ShutDown,
    /// Job was queued but the loop could not be woken.
    #[error(transparent)]
    Wake(#[from] WakeError),
}

/// State shared between the loop thread and schedulers.
pub struct RunnerHandle {
    /// MPSC queue: any thread pushes, loop pops.
    queue: ArrayQueue<Job>,
    notifier: WakeNotifier,
    shutdown: AtomicBool,
}

impl RunnerHandle {
    /// Queue `job` for the loop thread and wake the loop.
    pub fn schedule<F>(&self, job: F) -> Result<(), ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(ScheduleError::ShutDown);
        }
        self.queue
            .push(Box::new(job))
            .map_err(|_| ScheduleError::QueueFull)?;
        self.notifier.notify()?;
        Ok(())
    }

    /// Jobs queued but not yet run (hint, may be stale).
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn run_queued(&self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.queue.pop() {
            job();
            ran += 1;
        }
        ran
    }
}

/// Handle to the loop thread.
pub struct LoopRunner {
    shared: Arc<RunnerHandle>,
    thread: Option<thread::JoinHandle<()>>,
}

impl LoopRunner {
    /// Open a wake event on a fresh `PollLoop` and start the loop thread.
    pub fn start(config: LoopConfig, wake: WakeConfig) -> Result<Self, RunnerError> {
        config.validate().map_err(RunnerError::Config)?;

        let mut poll = PollLoop::new(&config);
        let mut event = WakeEvent::new(wake);
        event.open(&mut poll)?;
        let notifier = event.notifier().ok_or(WakeError::NotOpen)?;

        let shared = Arc::new(RunnerHandle {
            queue: ArrayQueue::new(config.queue_capacity),
            notifier,
            shutdown: AtomicBool::new(false),
        });
        let shared_clone = shared.clone();

        let thread = thread::Builder::new()
            .name("wake-loop".into())
            .spawn(move || run_loop(shared_clone, poll, event))
            .map_err(RunnerError::Spawn)?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Shared state for schedulers on other threads.
    pub fn handle(&self) -> Arc<RunnerHandle> {
        self.shared.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some() && !self.shared.is_shutdown()
    }

    /// Stop the loop and join it. Jobs already queued still run; jobs
    /// scheduled concurrently with shutdown may be dropped unrun.
    pub fn shutdown(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Err(e) = self.shared.notifier.notify() {
            log::debug!("wake-loop: shutdown notify: {e}");
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("wake-loop: loop thread panicked");
            }
        }
    }
}

impl Drop for LoopRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Loop body, run on the dedicated thread until shutdown.
fn run_loop(shared: Arc<RunnerHandle>, mut poll: PollLoop, mut event: WakeEvent) {
    log::debug!("wake-loop: started, backend {:?}", event.kind());

    loop {
        if let Err(e) = poll.run_once(None) {
            log::error!("wake-loop: wait failed: {e}");
            break;
        }
        shared.run_queued();
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
    }

    shared.shutdown.store(true, Ordering::Release);
    let leftover = shared.run_queued();
    event.close(&mut poll);
    log::debug!("wake-loop: shutdown ({leftover} jobs run after stop)");
}
