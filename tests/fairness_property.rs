//! Property tests for arbitration determinism and counter conservation.
//!
//! These drive the scheduler directly (no worker pool), acting as a single
//! manual worker so dispatch order is deterministic.

use proptest::collection::vec;
use proptest::prelude::*;

use std::time::Duration;

use fairsched_rs::{
    jain_index, ClientConfig, DeficitRoundRobin, OverflowStrategy, Scheduler, WeightedRoundRobin,
};

/// Register `weights.len()` clients named c0, c1, ... with the given
/// weights.
fn scheduler_for(weights: &[usize], policy: PolicyKind) -> Scheduler {
    let scheduler = match policy {
        PolicyKind::Wrr => Scheduler::with_policy(Box::new(WeightedRoundRobin::new())),
        PolicyKind::Drr { base_quantum } => {
            Scheduler::with_policy(Box::new(DeficitRoundRobin::new(base_quantum)))
        }
    };
    for (i, &weight) in weights.iter().enumerate() {
        scheduler
            .register_client(
                format!("c{i}"),
                ClientConfig {
                    weight,
                    ..ClientConfig::default()
                },
            )
            .unwrap();
    }
    scheduler
}

#[derive(Clone, Copy, Debug)]
enum PolicyKind {
    Wrr,
    Drr { base_quantum: u32 },
}

/// Act as the only worker: pop and "execute" until empty, returning the
/// dispatch order as client indices.
fn drain_recording(scheduler: &Scheduler) -> Vec<usize> {
    let mut dispatched = Vec::new();
    while let Some(job) = scheduler.select_next_job() {
        let client_id = job.client_id().to_string();
        let idx: usize = client_id[1..].parse().unwrap();
        dispatched.push(idx);
        job.run();
        scheduler.record_execution(&client_id, Duration::from_micros(1));
    }
    dispatched
}

proptest! {
    /// With every client pre-filled past its weight, the first cycle of
    /// WRR dispatches exactly weight_i consecutive jobs per client, in
    /// registration order.
    #[test]
    fn wrr_first_cycle_is_weights_in_registration_order(
        weights in vec(1usize..=4, 2..=5),
        extra in 0usize..3,
    ) {
        let scheduler = scheduler_for(&weights, PolicyKind::Wrr);
        for (i, &w) in weights.iter().enumerate() {
            for _ in 0..w + extra {
                scheduler.submit(&format!("c{i}"), || {}).unwrap();
            }
        }

        let dispatched = drain_recording(&scheduler);

        let expected_first_cycle: Vec<usize> = weights
            .iter()
            .enumerate()
            .flat_map(|(i, &w)| std::iter::repeat(i).take(w))
            .collect();
        prop_assert_eq!(&dispatched[..expected_first_cycle.len()], &expected_first_cycle[..]);

        // Everything submitted eventually runs.
        let total: usize = weights.iter().map(|&w| w + extra).sum();
        prop_assert_eq!(dispatched.len(), total);
    }

    /// Unit costs, equal weights, base_quantum = 1: DRR is plain round
    /// robin over the registration order.
    #[test]
    fn drr_unit_cost_equal_weights_is_round_robin(
        clients in 2usize..=5,
        rounds in 1usize..=6,
    ) {
        let weights = vec![1usize; clients];
        let scheduler = scheduler_for(&weights, PolicyKind::Drr { base_quantum: 1 });
        for i in 0..clients {
            for _ in 0..rounds {
                scheduler.submit(&format!("c{i}"), || {}).unwrap();
            }
        }

        let dispatched = drain_recording(&scheduler);
        let expected: Vec<usize> = (0..rounds).flat_map(|_| 0..clients).collect();
        prop_assert_eq!(dispatched, expected);
    }

    /// DRR splits backlogged unit-cost work in proportion to weights: a
    /// full cycle grants weight_i * base_quantum dispatches per client.
    #[test]
    fn drr_backlogged_cycle_matches_weights(
        weights in vec(1usize..=3, 2..=4),
    ) {
        let scheduler = scheduler_for(&weights, PolicyKind::Drr { base_quantum: 1 });
        // Deep backlogs: two full cycles of work for everyone.
        for (i, &w) in weights.iter().enumerate() {
            for _ in 0..2 * w {
                scheduler.submit(&format!("c{i}"), || {}).unwrap();
            }
        }

        let dispatched = drain_recording(&scheduler);
        let expected: Vec<usize> = (0..2)
            .flat_map(|_| {
                weights
                    .iter()
                    .enumerate()
                    .flat_map(|(i, &w)| std::iter::repeat(i).take(w))
                    .collect::<Vec<_>>()
            })
            .collect();
        prop_assert_eq!(dispatched, expected);
    }

    /// After a full drain, submitted == executed + overflow for every
    /// client, and the global counter matches the per-client sum, no
    /// matter the overflow strategy or submission pattern. Block is
    /// excluded: with no concurrent worker a blocked submitter would wait
    /// forever.
    #[test]
    fn conservation_identity_after_drain(
        specs in vec(
            (
                prop_oneof![
                    Just(OverflowStrategy::Reject),
                    Just(OverflowStrategy::DropOldest),
                    Just(OverflowStrategy::DropNewest),
                ],
                0usize..=4,   // max_queue_depth (0 = unlimited)
                0usize..=10,  // submissions
            ),
            1..=4,
        ),
    ) {
        let scheduler = Scheduler::new();
        for (i, &(overflow, max_queue_depth, _)) in specs.iter().enumerate() {
            scheduler
                .register_client(
                    format!("c{i}"),
                    ClientConfig { weight: 1, max_queue_depth, overflow },
                )
                .unwrap();
        }
        for (i, &(_, _, submissions)) in specs.iter().enumerate() {
            for _ in 0..submissions {
                let _ = scheduler.submit(&format!("c{i}"), || {});
            }
        }

        let dispatched = drain_recording(&scheduler);

        let mut executed_sum = 0u64;
        for (i, &(_, _, submissions)) in specs.iter().enumerate() {
            let m = scheduler.get_client_metrics(&format!("c{i}")).unwrap();
            prop_assert_eq!(m.submitted, submissions as u64);
            prop_assert_eq!(m.submitted, m.executed + m.overflow_count);
            prop_assert_eq!(m.queue_depth, 0);
            executed_sum += m.executed;
        }
        prop_assert_eq!(scheduler.total_jobs_processed(), executed_sum);
        prop_assert_eq!(dispatched.len() as u64, executed_sum);
    }

    /// Jain's index stays within [1/n, 1.0] for any executed counts.
    #[test]
    fn jain_index_stays_within_bounds(counts in vec(0u64..10_000, 2..=8)) {
        let j = jain_index(&counts);
        let n = counts.len() as f64;
        prop_assert!(j <= 1.0 + 1e-9, "jain={j}");
        prop_assert!(j >= 1.0 / n - 1e-9, "jain={j}");
    }
}
