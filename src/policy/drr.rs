//! Deficit Round Robin.
//!
//! Each client carries a signed credit balance. Arriving at a non-empty
//! client whose balance is non-positive refills it by
//! `weight * base_quantum`; every dequeue charges the job's cost hint.
//! When the balance goes non-positive the cursor rotates. Over long runs
//! the executed-cost ratio between two backlogged clients tends to the
//! ratio of their weights, independent of per-job cost variance.
//!
//! An empty client has its balance reset to zero before the cursor moves
//! on, so idle tenants cannot hoard credit for a later burst.
//!
//! With unit costs, `base_quantum = 1`, and equal weights, DRR degenerates
//! to strict one-slot round robin.

use ahash::AHashMap;

use super::{ClientMap, SchedulingPolicy};
use crate::job::Job;

/// Credits added per refill, scaled by client weight.
pub const DEFAULT_BASE_QUANTUM: u32 = 100;

/// Deficit Round Robin arbiter; the cost-aware counterpart of
/// [`WeightedRoundRobin`](super::WeightedRoundRobin).
#[derive(Debug)]
pub struct DeficitRoundRobin {
    base_quantum: u32,
    /// Cursor into the registration order.
    drr_index: usize,
    /// Signed credit balance per client; entries created at registration.
    deficit: AHashMap<String, i64>,
}

impl DeficitRoundRobin {
    /// `base_quantum` is the per-round credit unit; a client refills by
    /// `weight * base_quantum` when its balance is exhausted.
    pub fn new(base_quantum: u32) -> Self {
        Self {
            base_quantum,
            drr_index: 0,
            deficit: AHashMap::default(),
        }
    }
}

impl Default for DeficitRoundRobin {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_QUANTUM)
    }
}

impl SchedulingPolicy for DeficitRoundRobin {
    fn on_client_registered(&mut self, client_id: &str, _weight: usize) {
        self.deficit.insert(client_id.to_string(), 0);
    }

    fn select_next_job(&mut self, order: &[String], clients: &ClientMap) -> Option<Job> {
        let n = order.len();

        for _ in 0..n {
            let current = &order[self.drr_index];
            let client = clients
                .get(current)
                .expect("registry order and map agree");

            match client.take_next_job() {
                None => {
                    // Idle clients accrue no credit.
                    let deficit = self
                        .deficit
                        .get_mut(current)
                        .expect("deficit entry created at registration");
                    *deficit = 0;
                    self.drr_index = (self.drr_index + 1) % n;
                }
                Some(job) => {
                    let deficit = self
                        .deficit
                        .get_mut(current)
                        .expect("deficit entry created at registration");
                    if *deficit <= 0 {
                        *deficit += client.weight() as i64 * i64::from(self.base_quantum);
                    }
                    *deficit -= i64::from(job.cost_hint());
                    if *deficit <= 0 {
                        // Quota spent; next call starts at the next client.
                        self.drr_index = (self.drr_index + 1) % n;
                    }
                    return Some(job);
                }
            }
        }

        None
    }
}
