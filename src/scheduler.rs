//! Central registry, submission path, and policy invocation.
//!
//! # Architecture
//!
//! ```text
//!  client threads                Scheduler                     worker threads
//!       │                                                            │
//!  submit(id, task) ──► registry (RwLock) ──► ClientState ◄── select_next_job()
//!       │                  │    resolve CCB     │ queue+CV          │
//!       │                  │                    │                   │
//!       │                  └─► policy (Mutex) ──┘ pop one job ◄─────┘
//!       │                        WRR / DRR                          │
//!       └──► work signal (Mutex+Condvar) ◄──── idle wait ───────────┘
//! ```
//!
//! # Lock hierarchy
//!
//! Acquired strictly in this order, releasing before any user callable
//! runs:
//!
//! 1. Registry lock (read for submit/select/metrics, write for
//!    registration).
//! 2. Policy mutex.
//! 3. One client queue mutex (never two).
//!
//! The work signal is touched only after every other lock is released.
//!
//! # Correctness Invariants
//!
//! - The registry map and its order vector always hold the same id set.
//! - Registered clients are never removed; `Arc<ClientState>` handles stay
//!   valid for the scheduler's lifetime.
//! - Policy cursor/credit state mutates only under the policy mutex.
//! - `job_id` is assigned from one monotonic counter, starting at 1.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, RwLock};
use std::time::Duration;

use crossbeam_utils::CachePadded;

use crate::client::{ClientConfig, ClientState};
use crate::error::SchedulerError;
use crate::job::Job;
use crate::metrics::{jain_index, ClientMetrics, GlobalMetrics};
use crate::policy::{ClientMap, SchedulingPolicy, WeightedRoundRobin};

/// Wakes idle workers when work arrives or shutdown state changes.
///
/// Owned by the scheduler so `submit` can notify a worker directly; the
/// pool waits on it and broadcasts over it during shutdown. Waiters always
/// use a timeout, so a wakeup that races a sleeper costs at most one
/// timeout period.
pub(crate) struct WorkSignal {
    lock: Mutex<()>,
    cv: Condvar,
}

impl WorkSignal {
    fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cv: Condvar::new(),
        }
    }

    /// Wake one idle worker.
    pub(crate) fn notify_one(&self) {
        self.cv.notify_one();
    }

    /// Wake every idle worker.
    pub(crate) fn notify_all(&self) {
        self.cv.notify_all();
    }

    /// Sleep until notified or until `timeout` elapses.
    pub(crate) fn wait_timeout(&self, timeout: Duration) {
        let guard = self.lock.lock().expect("work signal mutex poisoned");
        let _ = self
            .cv
            .wait_timeout(guard, timeout)
            .expect("work signal condvar poisoned");
    }
}

/// Registry contents: id -> pinned CCB, plus registration order. Policies
/// iterate the order vector; the map is the O(1) lookup side.
struct Registry {
    clients: ClientMap,
    order: Vec<String>,
}

/// Multi-tenant fair scheduler. See the crate docs for the full model.
///
/// Shared across submitter and worker threads behind an `Arc`; all
/// operations take `&self`.
pub struct Scheduler {
    registry: RwLock<Registry>,
    policy: Mutex<Box<dyn SchedulingPolicy>>,
    next_job_id: CachePadded<AtomicU64>,
    total_processed: CachePadded<AtomicU64>,
    work_signal: WorkSignal,
}

impl Scheduler {
    /// Scheduler arbitrating with [`WeightedRoundRobin`].
    pub fn new() -> Self {
        Self::with_policy(Box::new(WeightedRoundRobin::new()))
    }

    /// Scheduler arbitrating with the supplied policy.
    pub fn with_policy(policy: Box<dyn SchedulingPolicy>) -> Self {
        Self {
            registry: RwLock::new(Registry {
                clients: ClientMap::default(),
                order: Vec::new(),
            }),
            policy: Mutex::new(policy),
            next_job_id: CachePadded::new(AtomicU64::new(1)),
            total_processed: CachePadded::new(AtomicU64::new(0)),
            work_signal: WorkSignal::new(),
        }
    }

    /// Register a new client.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidWeight`] if `cfg.weight == 0`;
    /// [`SchedulerError::AlreadyRegistered`] if the id is already known.
    /// A failed call mutates nothing.
    pub fn register_client(
        &self,
        client_id: impl Into<String>,
        cfg: ClientConfig,
    ) -> Result<(), SchedulerError> {
        let client_id = client_id.into();
        if cfg.weight == 0 {
            return Err(SchedulerError::InvalidWeight { client_id });
        }

        let mut registry = self.registry.write().expect("registry lock poisoned");
        if registry.clients.contains_key(&client_id) {
            return Err(SchedulerError::AlreadyRegistered { client_id });
        }

        let state = ClientState::new(client_id.clone(), cfg);
        registry.clients.insert(client_id.clone(), state);
        registry.order.push(client_id.clone());

        // Registry write lock is still held, per the policy contract.
        let mut policy = self.policy.lock().expect("policy mutex poisoned");
        policy.on_client_registered(&client_id, cfg.weight);
        Ok(())
    }

    /// Submit a unit-cost task for `client_id`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::UnknownClient`] if the id is not registered;
    /// [`SchedulerError::QueueFull`] if the client queue is at capacity
    /// under [`OverflowStrategy::Reject`](crate::OverflowStrategy::Reject).
    ///
    /// May block under `Block` overflow until a worker makes room.
    pub fn submit<F>(&self, client_id: &str, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_with_cost(client_id, task, 1)
    }

    /// Submit a task with an explicit cost hint for cost-aware policies.
    /// Hints below 1 are treated as 1.
    pub fn submit_with_cost<F>(
        &self,
        client_id: &str,
        task: F,
        cost_hint: u32,
    ) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let client = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry
                .clients
                .get(client_id)
                .cloned()
                .ok_or_else(|| SchedulerError::UnknownClient {
                    client_id: client_id.to_string(),
                })?
        };

        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let job = Job::new(
            client_id.to_string(),
            Box::new(task),
            job_id,
            cost_hint.max(1),
        );

        // Registry lock already released; only this client's queue lock is
        // taken inside admit, and Block waits with no other lock held.
        client.admit(job)?;
        self.work_signal.notify_one();
        Ok(())
    }

    /// Ask the active policy for the next job. Returns `None` when every
    /// client queue is empty. All scheduler locks are released before this
    /// returns, so callers execute the job lock-free.
    pub fn select_next_job(&self) -> Option<Job> {
        let registry = self.registry.read().expect("registry lock poisoned");
        if registry.order.is_empty() {
            return None;
        }
        let mut policy = self.policy.lock().expect("policy mutex poisoned");
        policy.select_next_job(&registry.order, &registry.clients)
    }

    /// Record a completed execution for `client_id`.
    ///
    /// Unknown ids are ignored: clients cannot be unregistered, so this
    /// only arises in teardown races. The duration is also forwarded to
    /// the policy's `on_job_executed` hook.
    pub fn record_execution(&self, client_id: &str, duration: Duration) {
        let registry = self.registry.read().expect("registry lock poisoned");
        let Some(client) = registry.clients.get(client_id) else {
            return;
        };

        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        client.record_execution(micros);
        self.total_processed.fetch_add(1, Ordering::Relaxed);

        let mut policy = self.policy.lock().expect("policy mutex poisoned");
        policy.on_job_executed(client_id, duration);
    }

    /// Snapshot one client's counters.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::UnknownClient`] if the id is not registered.
    pub fn get_client_metrics(&self, client_id: &str) -> Result<ClientMetrics, SchedulerError> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let client = registry
            .clients
            .get(client_id)
            .ok_or_else(|| SchedulerError::UnknownClient {
                client_id: client_id.to_string(),
            })?;

        let executed = client.executed();
        let avg_execution_time_us = if executed > 0 {
            client.total_execution_us() as f64 / executed as f64
        } else {
            0.0
        };

        Ok(ClientMetrics {
            submitted: client.submitted(),
            executed,
            avg_execution_time_us,
            queue_depth: client.queue_depth(),
            weight: client.weight(),
            overflow_count: client.overflowed(),
        })
    }

    /// Snapshot scheduler-wide counters, including the Jain fairness index
    /// over per-client executed counts.
    pub fn get_global_metrics(&self) -> GlobalMetrics {
        let registry = self.registry.read().expect("registry lock poisoned");
        let executed: Vec<u64> = registry.clients.values().map(|c| c.executed()).collect();

        GlobalMetrics {
            total_processed: self.total_processed.load(Ordering::Relaxed),
            active_clients: registry.clients.len(),
            jain_fairness_index: jain_index(&executed),
        }
    }

    /// Total executions across all clients since construction.
    pub fn total_jobs_processed(&self) -> u64 {
        self.total_processed.load(Ordering::Relaxed)
    }

    /// True if any client has queued work. Takes each client queue lock
    /// briefly; the answer can be stale by the time it is returned.
    pub fn has_pending_jobs(&self) -> bool {
        let registry = self.registry.read().expect("registry lock poisoned");
        registry.clients.values().any(|c| c.queue_depth() > 0)
    }

    pub(crate) fn work_signal(&self) -> &WorkSignal {
        &self.work_signal
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::OverflowStrategy;
    use crate::policy::DeficitRoundRobin;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn register_rejects_zero_weight() {
        let s = Scheduler::new();
        let err = s
            .register_client(
                "z",
                ClientConfig {
                    weight: 0,
                    ..ClientConfig::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidWeight { .. }));
        // Nothing registered.
        assert!(matches!(
            s.get_client_metrics("z"),
            Err(SchedulerError::UnknownClient { .. })
        ));
    }

    #[test]
    fn register_rejects_duplicate_id_without_mutation() {
        let s = Scheduler::new();
        s.register_client("dup", ClientConfig::default()).unwrap();
        s.submit("dup", || {}).unwrap();

        let err = s
            .register_client(
                "dup",
                ClientConfig {
                    weight: 9,
                    ..ClientConfig::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyRegistered { .. }));

        // First registration untouched.
        let m = s.get_client_metrics("dup").unwrap();
        assert_eq!(m.weight, 1);
        assert_eq!(m.queue_depth, 1);
    }

    #[test]
    fn submit_to_unknown_client_fails() {
        let s = Scheduler::new();
        let err = s.submit("nobody", || {}).unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownClient { .. }));
    }

    #[test]
    fn select_on_empty_registry_is_none() {
        let s = Scheduler::new();
        assert!(s.select_next_job().is_none());
    }

    #[test]
    fn manual_worker_drains_fifo_and_records() {
        let s = Scheduler::new();
        s.register_client("a", ClientConfig::default()).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let h = Arc::clone(&hits);
            s.submit("a", move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert!(s.has_pending_jobs());

        let mut ids = Vec::new();
        while let Some(job) = s.select_next_job() {
            ids.push(job.job_id());
            let client = job.client_id().to_string();
            job.run();
            s.record_execution(&client, Duration::from_micros(10));
        }

        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(!s.has_pending_jobs());
        assert_eq!(s.total_jobs_processed(), 5);

        let m = s.get_client_metrics("a").unwrap();
        assert_eq!(m.submitted, 5);
        assert_eq!(m.executed, 5);
        assert_eq!(m.queue_depth, 0);
        assert!((m.avg_execution_time_us - 10.0).abs() < 1e-9);
    }

    #[test]
    fn record_execution_on_unknown_id_is_a_no_op() {
        let s = Scheduler::new();
        s.record_execution("ghost", Duration::from_micros(1));
        assert_eq!(s.total_jobs_processed(), 0);
    }

    #[test]
    fn global_metrics_reflect_executed_counts() {
        let s = Scheduler::new();
        for id in ["a", "b", "c"] {
            s.register_client(id, ClientConfig::default()).unwrap();
        }
        let gm = s.get_global_metrics();
        assert_eq!(gm.active_clients, 3);
        assert_eq!(gm.total_processed, 0);
        assert_eq!(gm.jain_fairness_index, 1.0); // nothing executed yet

        // One client does all the work: index collapses to 1/3.
        for _ in 0..4 {
            s.submit("a", || {}).unwrap();
        }
        while let Some(job) = s.select_next_job() {
            let client = job.client_id().to_string();
            job.run();
            s.record_execution(&client, Duration::ZERO);
        }
        let gm = s.get_global_metrics();
        assert_eq!(gm.total_processed, 4);
        assert!((gm.jain_fairness_index - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn reject_overflow_surfaces_queue_full() {
        let s = Scheduler::new();
        s.register_client(
            "limited",
            ClientConfig {
                weight: 1,
                max_queue_depth: 2,
                overflow: OverflowStrategy::Reject,
            },
        )
        .unwrap();

        s.submit("limited", || {}).unwrap();
        s.submit("limited", || {}).unwrap();
        let err = s.submit("limited", || {}).unwrap_err();
        assert!(matches!(err, SchedulerError::QueueFull { .. }));
        assert_eq!(s.get_client_metrics("limited").unwrap().overflow_count, 1);
    }

    #[test]
    fn policy_constructor_is_honored() {
        let s = Scheduler::with_policy(Box::new(DeficitRoundRobin::new(1)));
        s.register_client("a", ClientConfig::default()).unwrap();
        s.register_client("b", ClientConfig::default()).unwrap();
        for _ in 0..2 {
            s.submit("a", || {}).unwrap();
            s.submit("b", || {}).unwrap();
        }

        let mut seq = String::new();
        while let Some(job) = s.select_next_job() {
            seq.push_str(job.client_id());
        }
        assert_eq!(seq, "abab");
    }

    #[test]
    fn job_ids_are_monotonic_across_clients() {
        let s = Scheduler::new();
        s.register_client("a", ClientConfig::default()).unwrap();
        s.register_client("b", ClientConfig::default()).unwrap();
        s.submit("a", || {}).unwrap();
        s.submit("b", || {}).unwrap();
        s.submit("a", || {}).unwrap();

        let mut ids = Vec::new();
        while let Some(job) = s.select_next_job() {
            ids.push(job.job_id());
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
