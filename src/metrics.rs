//! Observability snapshots and the fairness index.
//!
//! Both snapshot types are plain data and serde-serializable so hosts can
//! ship them to whatever sink they use. Counters are sampled with relaxed
//! loads; a snapshot taken while workers are running may pair an
//! `executed` from one instant with a `total_execution_time_us` from
//! another, so `avg_execution_time_us` can carry a small transient skew.
//! Quiescent reads are exact.

use serde::{Deserialize, Serialize};

/// Point-in-time view of one client's counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMetrics {
    /// Submission attempts that resolved this client, admitted or not.
    pub submitted: u64,
    /// Jobs whose callable has run to completion (or panicked; panics
    /// still count as executions).
    pub executed: u64,
    /// Mean callable runtime in microseconds; 0.0 before any execution.
    pub avg_execution_time_us: f64,
    /// Queue depth at the sampling instant.
    pub queue_depth: usize,
    /// Immutable registration weight.
    pub weight: usize,
    /// Rejected or dropped submissions.
    pub overflow_count: u64,
}

/// Point-in-time view of scheduler-wide counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    /// Total executions across all clients.
    pub total_processed: u64,
    /// Registered clients (registration is permanent).
    pub active_clients: usize,
    /// Jain's fairness index over per-client executed counts, in
    /// `[1/n, 1.0]`.
    pub jain_fairness_index: f64,
}

/// Jain's fairness index: `(sum x_i)^2 / (n * sum x_i^2)`.
///
/// Returns 1.0 when fewer than two clients exist or when nothing has
/// executed anywhere; 1.0 is perfect fairness, `1/n` is a single client
/// hogging all throughput.
pub fn jain_index(executed: &[u64]) -> f64 {
    if executed.len() < 2 {
        return 1.0;
    }
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &x in executed {
        let x = x as f64;
        sum += x;
        sum_sq += x * x;
    }
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (executed.len() as f64 * sum_sq)
}
