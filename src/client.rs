//! Per-client control block: queue, backpressure, counters.
//!
//! Each registered client gets one [`ClientState`]. It owns the client's
//! FIFO queue behind a private mutex, a condvar that signals "space became
//! available" to submitters blocked under [`OverflowStrategy::Block`], the
//! client's metric counters, and the immutable backpressure configuration.
//!
//! # Pinning
//!
//! Workers and policies hold shared references to a `ClientState` across
//! lock acquisitions, so its address must be stable for the lifetime of the
//! scheduler. The registry stores `Arc<ClientState>` and never removes
//! entries; the block is dropped only after every worker has stopped.
//!
//! # Correctness Invariants
//!
//! - The queue mutex guards the queue and its condvar; nothing else.
//! - `executed_count <= submitted_count` at all times.
//! - At any globally quiescent point,
//!   `submitted_count == executed_count + overflow_count + queue_depth`.
//! - Counters are monotonic; relaxed loads are sufficient for readers.
//! - A successful dequeue notifies the space condvar exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::error::SchedulerError;
use crate::job::Job;

/// What `submit` does when a bounded queue is at capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowStrategy {
    /// Count the overflow and fail the submission with
    /// [`SchedulerError::QueueFull`].
    Reject,
    /// Block the submitter until a worker dequeues and makes room. No
    /// overflow is counted.
    Block,
    /// Evict the oldest queued job to make room, counting one overflow.
    DropOldest,
    /// Silently discard the incoming job, counting one overflow.
    DropNewest,
}

/// Registration-time configuration for one client.
///
/// `max_queue_depth == 0` means unlimited; the overflow strategy is then
/// never consulted.
#[derive(Clone, Copy, Debug)]
pub struct ClientConfig {
    /// Scheduling share: slots per cycle (WRR) or credit multiplier (DRR).
    /// Must be >= 1; `register_client` rejects 0.
    pub weight: usize,
    /// Queue capacity. 0 = unlimited.
    pub max_queue_depth: usize,
    /// Applied when the queue is at capacity.
    pub overflow: OverflowStrategy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            weight: 1,
            max_queue_depth: 0,
            overflow: OverflowStrategy::Reject,
        }
    }
}

/// Per-client state. See the module docs for the locking and pinning rules.
pub struct ClientState {
    client_id: String,
    weight: usize,
    max_queue_depth: usize,
    overflow: OverflowStrategy,

    queue: Mutex<VecDeque<Job>>,
    /// Signaled after every successful dequeue; awaited by `Block`
    /// submitters.
    space_available: Condvar,

    submitted_count: AtomicU64,
    executed_count: AtomicU64,
    total_execution_time_us: AtomicU64,
    overflow_count: AtomicU64,
}

impl ClientState {
    pub(crate) fn new(client_id: String, cfg: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            client_id,
            weight: cfg.weight,
            max_queue_depth: cfg.max_queue_depth,
            overflow: cfg.overflow,
            queue: Mutex::new(VecDeque::new()),
            space_available: Condvar::new(),
            submitted_count: AtomicU64::new(0),
            executed_count: AtomicU64::new(0),
            total_execution_time_us: AtomicU64::new(0),
            overflow_count: AtomicU64::new(0),
        })
    }

    #[inline]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[inline]
    pub fn weight(&self) -> usize {
        self.weight
    }

    #[inline]
    pub fn max_queue_depth(&self) -> usize {
        self.max_queue_depth
    }

    #[inline]
    pub fn overflow_strategy(&self) -> OverflowStrategy {
        self.overflow
    }

    /// Current queue depth. Takes the queue lock briefly; the value may be
    /// stale by the time the caller uses it.
    pub fn queue_depth(&self) -> usize {
        self.queue.lock().expect("client queue mutex poisoned").len()
    }

    /// Enqueue `job`, applying the overflow strategy if the queue is
    /// bounded and at capacity.
    ///
    /// Every attempt increments `submitted_count`, admitted or not, so the
    /// accounting identity `submitted == executed + overflow + depth` holds
    /// under all four strategies.
    ///
    /// May block the calling thread under [`OverflowStrategy::Block`] until
    /// a worker dequeues from this client.
    pub(crate) fn admit(&self, job: Job) -> Result<(), SchedulerError> {
        self.submitted_count.fetch_add(1, Ordering::Relaxed);

        let mut queue = self.queue.lock().expect("client queue mutex poisoned");
        if self.max_queue_depth > 0 {
            match self.overflow {
                OverflowStrategy::Reject => {
                    if queue.len() >= self.max_queue_depth {
                        self.overflow_count.fetch_add(1, Ordering::Relaxed);
                        return Err(SchedulerError::QueueFull {
                            client_id: self.client_id.clone(),
                            max_queue_depth: self.max_queue_depth,
                        });
                    }
                }
                OverflowStrategy::Block => {
                    while queue.len() >= self.max_queue_depth {
                        queue = self
                            .space_available
                            .wait(queue)
                            .expect("client queue condvar poisoned");
                    }
                }
                OverflowStrategy::DropOldest => {
                    if queue.len() >= self.max_queue_depth {
                        queue.pop_front();
                        self.overflow_count.fetch_add(1, Ordering::Relaxed);
                    }
                }
                OverflowStrategy::DropNewest => {
                    if queue.len() >= self.max_queue_depth {
                        self.overflow_count.fetch_add(1, Ordering::Relaxed);
                        return Ok(()); // job silently discarded
                    }
                }
            }
        }
        queue.push_back(job);
        Ok(())
    }

    /// Pop the front job, if any. On success, notifies the space condvar so
    /// a `Block`-waiting submitter can proceed.
    ///
    /// This is the only dequeue path; policies call it while holding the
    /// scheduler policy mutex, which keeps the lock order
    /// registry -> policy -> one client queue.
    pub fn take_next_job(&self) -> Option<Job> {
        let mut queue = self.queue.lock().expect("client queue mutex poisoned");
        let job = queue.pop_front();
        drop(queue);
        if job.is_some() {
            self.space_available.notify_one();
        }
        job
    }

    /// Record one completed execution of `duration_us` microseconds.
    pub(crate) fn record_execution(&self, duration_us: u64) {
        self.executed_count.fetch_add(1, Ordering::Relaxed);
        self.total_execution_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn submitted(&self) -> u64 {
        self.submitted_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn executed(&self) -> u64 {
        self.executed_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn total_execution_us(&self) -> u64 {
        self.total_execution_time_us.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn overflowed(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("client_id", &self.client_id)
            .field("weight", &self.weight)
            .field("max_queue_depth", &self.max_queue_depth)
            .field("overflow", &self.overflow)
            .finish_non_exhaustive()
    }
}
