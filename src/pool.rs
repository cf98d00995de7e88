//! Fixed-size worker pool with drain-then-stop shutdown.
//!
//! Workers pull through [`Scheduler::select_next_job`], execute the
//! callable with no lock held, and report the measured duration back via
//! [`Scheduler::record_execution`]. The pool owns only lifecycle state
//! (running/draining flags and the join handles); all queueing lives in
//! the scheduler.
//!
//! # Shutdown
//!
//! Graceful drain is the only mode:
//!
//! 1. Set `draining`, broadcast the work signal.
//! 2. Poll `has_pending_jobs` with millisecond sleeps, re-broadcasting
//!    each round to unstick any sleeping worker.
//! 3. Once empty, clear `running`, broadcast, join every worker.
//!
//! After `shutdown` returns, every admitted job has run exactly once.
//! `shutdown` is idempotent and `Drop` invokes it if the host never did.
//!
//! # Panic containment
//!
//! A panicking user callable is caught with `catch_unwind`; the execution
//! is still recorded and the worker keeps running. User-task failure is
//! invisible to scheduler state.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::scheduler::Scheduler;

/// Idle workers re-check for work at least this often; bounds the cost of
/// a wakeup lost to the sleep race.
const IDLE_WAIT: Duration = Duration::from_millis(1);

/// Sleep between `has_pending_jobs` polls while draining.
const DRAIN_POLL: Duration = Duration::from_millis(1);

/// Lifecycle flags shared between the pool handle and its workers.
struct PoolShared {
    /// Cleared as the last shutdown step; workers exit on observing false.
    running: AtomicBool,
    /// Set first during shutdown; workers finish remaining queued work and
    /// exit once the scheduler reports no pending jobs.
    draining: AtomicBool,
}

/// Fixed set of worker threads attached to one [`Scheduler`].
pub struct WorkerPool {
    scheduler: Arc<Scheduler>,
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawn `worker_count` workers pulling from `scheduler`.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is 0 or a worker thread cannot be spawned.
    pub fn new(scheduler: Arc<Scheduler>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");

        let shared = Arc::new(PoolShared {
            running: AtomicBool::new(true),
            draining: AtomicBool::new(false),
        });

        let workers = (0..worker_count)
            .map(|worker_id| {
                let scheduler = Arc::clone(&scheduler);
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("fairsched-worker-{worker_id}"))
                    .spawn(move || worker_loop(&scheduler, &shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            scheduler,
            shared,
            workers,
            worker_count,
        }
    }

    /// Drain every client queue, then stop and join all workers.
    ///
    /// Blocks until every job admitted before (or during) the drain has
    /// executed. Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.shared.draining.store(true, Ordering::Release);
        self.scheduler.work_signal().notify_all();

        while self.scheduler.has_pending_jobs() {
            self.scheduler.work_signal().notify_all();
            thread::sleep(DRAIN_POLL);
        }

        self.shared.running.store(false, Ordering::Release);
        self.scheduler.work_signal().notify_all();

        for handle in self.workers.drain(..) {
            // User-task panics are contained in the worker; a panicking
            // worker thread means an internal bug. Don't panic again while
            // already unwinding (process abort).
            if handle.join().is_err() && !thread::panicking() {
                panic!("worker thread panicked");
            }
        }
    }

    /// False once `shutdown` has stopped the workers.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Configured pool size.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Wake every idle worker. Submission already wakes one worker per
    /// job; hosts can use this after out-of-band state changes.
    pub fn notify_workers(&self) {
        self.scheduler.work_signal().notify_all();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(scheduler: &Scheduler, shared: &PoolShared) {
    loop {
        if !shared.running.load(Ordering::Acquire) {
            return;
        }

        if let Some(job) = scheduler.select_next_job() {
            let client_id = job.client_id().to_string();
            let start = Instant::now();
            let _ = panic::catch_unwind(AssertUnwindSafe(|| job.run()));
            scheduler.record_execution(&client_id, start.elapsed());
            continue;
        }

        if shared.draining.load(Ordering::Acquire) && !scheduler.has_pending_jobs() {
            return;
        }

        scheduler.work_signal().wait_timeout(IDLE_WAIT);
    }
}
