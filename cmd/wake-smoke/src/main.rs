//! Wake Channel End-to-End Smoke Test
//!
//!   Part A: every supported backend on a PollLoop
//!   Part B: named FIFO shared by two channels
//!   Part C: LoopRunner with jobs scheduled from other threads
//!
//! Run: RUST_LOG=debug ./target/release/wake-smoke
//! FIFO paths default to a per-process file under the temp dir; set
//! WAKE_FIFO_PATH to use a fixed one.

use wake_core::error::WakeError;
use wake_core::watcher::WatchToken;
use wake_loop::{LoopConfig, LoopRunner, PollLoop};
use wake_module::{BackendKind, WakeConfig, WakeEvent};

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

// ── Test harness ──

struct TestRunner {
    total: usize,
    passed: usize,
    failed: usize,
}

const LINE: &str = "────────────────────────────────────────────────────────────";

impl TestRunner {
    fn new() -> Self {
        Self { total: 0, passed: 0, failed: 0 }
    }

    fn section(&self, name: &str) {
        println!("\n{}", LINE);
        println!("  {}", name);
        println!("{}", LINE);
    }

    fn pass(&mut self, name: &str) {
        self.total += 1;
        self.passed += 1;
        println!("  [{:2}] {:<52} PASS", self.total, name);
    }

    fn fail(&mut self, name: &str, reason: &str) {
        self.total += 1;
        self.failed += 1;
        println!("  [{:2}] {:<52} FAIL: {}", self.total, name, reason);
    }

    fn check(&mut self, name: &str, ok: bool, reason: &str) {
        if ok {
            self.pass(name);
        } else {
            self.fail(name, reason);
        }
    }

    fn summary(&self) {
        println!("\n{}", LINE);
        println!(
            "  Total: {}  Passed: {}  Failed: {}",
            self.total, self.passed, self.failed
        );
        println!("{}", LINE);
    }
}

fn fifo_path() -> PathBuf {
    std::env::var_os("WAKE_FIFO_PATH").map(PathBuf::from).unwrap_or_else(|| {
        std::env::temp_dir().join(format!("wake_smoke_{}.fifo", std::process::id()))
    })
}

// ════════════════════════════════════════════════════════════
// Part A: Backends
// ════════════════════════════════════════════════════════════

fn test_backend(t: &mut TestRunner, kind: BackendKind) {
    t.section(&format!("Part A: backend {kind}"));

    let mut lp = PollLoop::new(&LoopConfig::default());
    let mut event = WakeEvent::new(WakeConfig::new().backend(kind).fifo_path(fifo_path()));

    match event.open(&mut lp) {
        Ok(()) => t.pass("open"),
        Err(e) => {
            t.fail("open", &e.to_string());
            return;
        }
    }
    t.check("registered with loop", lp.is_watching(event.watch()), "no active watch");
    t.check(
        "second open rejected",
        event.open(&mut lp) == Err(WakeError::AlreadyOpen),
        "open twice succeeded",
    );

    // Pending-read check from registration.
    let first = lp.run_once(None);
    t.check("initial check finds nothing", first == Ok(0), &format!("{first:?}"));

    let notified = (0..5).map(|_| event.notify()).collect::<Result<Vec<_>, _>>();
    t.check("notify x5", notified.is_ok(), &format!("{notified:?}"));

    let woke = lp.run_once(Some(Duration::from_secs(1)));
    t.check("one wake for five notifies", woke == Ok(1), &format!("{woke:?}"));

    let quiet = lp.run_once(Some(Duration::from_millis(20)));
    t.check("drained after confirm", quiet == Ok(0), &format!("{quiet:?}"));

    // Burst far beyond any pipe buffer must not block.
    let burst = (0..200_000).try_for_each(|_| event.notify());
    t.check("notify burst never blocks", burst.is_ok(), &format!("{burst:?}"));
    let woke = lp.run_once(Some(Duration::from_secs(1)));
    t.check("burst drained in one wake", woke == Ok(1), &format!("{woke:?}"));

    event.close(&mut lp);
    t.check("closed", !event.is_open() && event.watch() == WatchToken::INVALID, "still open");
    t.check("loop watch removed", lp.watch_count() == 0, "watch left behind");
    t.check("notify after close", event.notify() == Err(WakeError::NotOpen), "notify succeeded");

    event.close(&mut lp);
    t.pass("close twice is a no-op");

    let reopened = event.open(&mut lp);
    t.check("reopen", reopened.is_ok(), &format!("{reopened:?}"));
    event.close(&mut lp);
}

// ════════════════════════════════════════════════════════════
// Part B: Shared FIFO
// ════════════════════════════════════════════════════════════

fn test_shared_fifo(t: &mut TestRunner) {
    t.section("Part B: named FIFO shared by two channels");

    let config = WakeConfig::new().backend(BackendKind::Fifo).fifo_path(fifo_path());
    let mut lp_a = PollLoop::new(&LoopConfig::default());
    let mut lp_b = PollLoop::new(&LoopConfig::default());
    let mut a = WakeEvent::new(config.clone());
    let mut b = WakeEvent::new(config);

    let opened = a.open(&mut lp_a).and_then(|()| b.open(&mut lp_b));
    t.check("open both", opened.is_ok(), &format!("{opened:?}"));
    if opened.is_err() {
        a.close(&mut lp_a);
        return;
    }
    let _ = lp_a.run_once(None);
    let _ = lp_b.run_once(None);

    let sent = a.notify();
    t.check("notify on A", sent.is_ok(), &format!("{sent:?}"));
    let woke = lp_b.run_once(Some(Duration::from_secs(1)));
    t.check("B wakes", woke == Ok(1), &format!("{woke:?}"));

    a.close(&mut lp_a);
    b.close(&mut lp_b);
    let _ = std::fs::remove_file(fifo_path());
}

// ════════════════════════════════════════════════════════════
// Part C: LoopRunner
// ════════════════════════════════════════════════════════════

fn test_runner(t: &mut TestRunner) {
    t.section("Part C: LoopRunner");

    let mut runner = match LoopRunner::start(LoopConfig::from_env(), WakeConfig::from_env()) {
        Ok(r) => {
            t.pass("start");
            r
        }
        Err(e) => {
            t.fail("start", &e.to_string());
            return;
        }
    };

    let ran = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();
    let producers: Vec<_> = (0..4)
        .map(|_| {
            let handle = runner.handle();
            let ran = ran.clone();
            let tx = tx.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    // Retry while the queue is full.
                    loop {
                        let ran = ran.clone();
                        let tx = tx.clone();
                        let job = move || {
                            ran.fetch_add(1, Ordering::SeqCst);
                            let _ = tx.send(());
                        };
                        if handle.schedule(job).is_ok() {
                            break;
                        }
                        std::thread::yield_now();
                    }
                }
            })
        })
        .collect();
    for p in producers {
        let _ = p.join();
    }

    let received = (0..1000).all(|_| rx.recv_timeout(Duration::from_secs(5)).is_ok());
    t.check("1000 jobs from 4 threads", received, &format!("ran {}", ran.load(Ordering::SeqCst)));

    runner.shutdown();
    t.check("shutdown", !runner.is_running(), "still running");
}

fn main() {
    env_logger::init();
    println!("=== Wake Channel End-to-End Smoke Test ===");
    println!("    default backend: {}", BackendKind::default());

    let mut t = TestRunner::new();

    for kind in BackendKind::ALL {
        if kind.is_supported() {
            test_backend(&mut t, kind);
        } else {
            println!("\n  backend {kind}: not supported on this target, skipped");
        }
    }
    test_shared_fifo(&mut t);
    test_runner(&mut t);

    t.summary();
    std::process::exit(if t.failed > 0 { 1 } else { 0 });
}
