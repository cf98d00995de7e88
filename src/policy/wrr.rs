//! Weighted Round Robin.
//!
//! Each client gets `weight` consecutive dispatch slots per cycle, visited
//! in registration order. An empty client forfeits the rest of its slots
//! immediately (work-conserving skip), so idle tenants never stall busy
//! ones.
//!
//! With a single worker the dispatch sequence over one cycle is fully
//! deterministic: client 1 runs `w_1` consecutive jobs, then client 2 runs
//! `w_2`, and so on, skipping empty clients.

use super::{ClientMap, SchedulingPolicy};
use crate::job::Job;

/// Weighted Round Robin arbiter. Cost hints are ignored; one dequeue
/// consumes one slot regardless of job size.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    /// Cursor into the registration order.
    rr_index: usize,
    /// Slots left for the client under the cursor; 0 triggers a lazy
    /// refill from that client's weight.
    rr_remaining: usize,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulingPolicy for WeightedRoundRobin {
    fn on_client_registered(&mut self, _client_id: &str, _weight: usize) {
        // Weight is read from the control block on demand; nothing to
        // initialize.
    }

    fn select_next_job(&mut self, order: &[String], clients: &ClientMap) -> Option<Job> {
        let n = order.len();

        for _ in 0..n {
            let client = clients
                .get(&order[self.rr_index])
                .expect("registry order and map agree");

            // Lazy refill when arriving at a client with no slots left.
            if self.rr_remaining == 0 {
                self.rr_remaining = client.weight();
            }

            if let Some(job) = client.take_next_job() {
                self.rr_remaining -= 1;
                if self.rr_remaining == 0 {
                    // Quota exhausted; next call starts at the next client.
                    self.rr_index = (self.rr_index + 1) % n;
                }
                return Some(job);
            }

            // Empty queue: forfeit remaining slots and move on.
            self.rr_remaining = 0;
            self.rr_index = (self.rr_index + 1) % n;
        }

        None
    }
}
