//! Centralized multi-tenant fair job scheduler with a bounded worker pool.
//!
//! Many named clients submit opaque callables; a pluggable arbitration
//! policy decides whose queue surrenders the next job; a fixed set of
//! worker threads executes them outside every lock. Per-client admission
//! control pushes back on noisy tenants, and counter-based metrics
//! (including Jain's fairness index) expose how fair the arbitration
//! actually was.
//!
//! # Overview
//!
//! ```text
//!   submitters (any threads)                        workers (fixed pool)
//!        │ submit(id, task)                                │
//!        ▼                                                 ▼
//!   ┌─────────────────────────── Scheduler ─────────────────────────────┐
//!   │  registry: id -> ClientState (FIFO queue, counters, backpressure) │
//!   │  policy:   WeightedRoundRobin | DeficitRoundRobin | custom        │
//!   └───────────────────────────────────────────────────────────────────┘
//!        │ overflow: Reject / Block / DropOldest / DropNewest
//!        ▼
//!   WorkerPool::shutdown() drains every queue, then stops the workers.
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`job`] | Move-only unit of work plus scheduling metadata |
//! | [`client`] | Per-client control block: queue, condvar, counters, config |
//! | [`policy`] | Arbitration trait and the WRR / DRR implementations |
//! | [`scheduler`] | Registry, submission path, policy invocation, metrics |
//! | [`pool`] | Worker threads and graceful drain-then-stop shutdown |
//! | [`metrics`] | Snapshot types and the Jain fairness index |
//! | [`error`] | Error taxonomy |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use fairsched_rs::{ClientConfig, Scheduler, WorkerPool};
//!
//! let scheduler = Arc::new(Scheduler::new());
//! scheduler.register_client("tenant-a", ClientConfig { weight: 2, ..ClientConfig::default() })?;
//! scheduler.register_client("tenant-b", ClientConfig::default())?;
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let d = Arc::clone(&done);
//!     scheduler.submit("tenant-a", move || { d.fetch_add(1, Ordering::Relaxed); })?;
//! }
//!
//! let mut pool = WorkerPool::new(Arc::clone(&scheduler), 2);
//! pool.shutdown();
//! assert_eq!(done.load(Ordering::Relaxed), 10);
//! assert_eq!(scheduler.total_jobs_processed(), 10);
//! # Ok::<(), fairsched_rs::SchedulerError>(())
//! ```
//!
//! # Guarantees
//!
//! - FIFO within each client; no ordering across clients.
//! - Work-conserving: a non-empty queue plus an idle worker dispatches
//!   within one policy scan.
//! - Graceful shutdown: every admitted job runs exactly once before
//!   `shutdown` returns.
//! - No user callable ever runs under a scheduler lock.

pub mod client;
pub mod error;
pub mod job;
pub mod metrics;
pub mod policy;
pub mod pool;
pub mod scheduler;

pub use client::{ClientConfig, ClientState, OverflowStrategy};
pub use error::SchedulerError;
pub use job::Job;
pub use metrics::{jain_index, ClientMetrics, GlobalMetrics};
pub use policy::{
    ClientMap, DeficitRoundRobin, SchedulingPolicy, WeightedRoundRobin, DEFAULT_BASE_QUANTUM,
};
pub use pool::WorkerPool;
pub use scheduler::Scheduler;
