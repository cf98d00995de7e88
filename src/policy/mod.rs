//! Pluggable arbitration policies.
//!
//! A policy decides which client's queue surrenders the next job. The
//! scheduler hands it the registration-ordered id list plus the id -> CCB
//! map and the policy walks them, taking one client queue lock at a time
//! through [`ClientState::take_next_job`].
//!
//! # Locking contract
//!
//! - `on_client_registered` runs while the registry write lock is held.
//! - `select_next_job` and `on_job_executed` run while the scheduler's
//!   policy mutex is held; private cursor/credit state needs no further
//!   synchronization.
//! - A policy never holds two client queue locks simultaneously, and never
//!   touches the registry lock itself.
//!
//! # Work conservation
//!
//! Both shipped policies skip empty clients without consuming their share,
//! so a single scan of `n` clients dispatches a job whenever any queue is
//! non-empty.

mod drr;
mod wrr;

pub use drr::{DeficitRoundRobin, DEFAULT_BASE_QUANTUM};
pub use wrr::WeightedRoundRobin;

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;

use crate::client::ClientState;
use crate::job::Job;

/// Lookup table handed to policies: client id -> pinned control block.
pub type ClientMap = AHashMap<String, Arc<ClientState>>;

/// Arbitration seam between the scheduler and a fairness discipline.
pub trait SchedulingPolicy: Send {
    /// A new client joined the registry. Called once per id, in
    /// registration order, under the registry write lock.
    fn on_client_registered(&mut self, client_id: &str, weight: usize);

    /// Pick the next job, or `None` if every client queue is empty.
    ///
    /// `order` is the registration-ordered id list; `clients` maps each of
    /// those ids to its control block.
    fn select_next_job(&mut self, order: &[String], clients: &ClientMap) -> Option<Job>;

    /// A job from `client_id` finished executing. Default no-op; exists
    /// for time-aware policies.
    fn on_job_executed(&mut self, _client_id: &str, _duration: Duration) {}
}
