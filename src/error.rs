//! Error types for registration and submission.
//!
//! All failures surface to the API caller; nothing is caught internally.
//! Drops under `DropOldest`/`DropNewest` are observability events counted
//! in `overflow_count`, not errors. A panicking user callable is likewise
//! outside this taxonomy: it is contained by the worker and leaves the
//! scheduler in a consistent state.

use std::fmt;

/// Errors reported by [`Scheduler`](crate::Scheduler) operations.
///
/// The enum is `#[non_exhaustive]`; consumers should include a fallback
/// match arm.
#[derive(Debug)]
#[non_exhaustive]
pub enum SchedulerError {
    /// `register_client` was given a zero weight. Weights must be >= 1.
    InvalidWeight { client_id: String },
    /// `register_client` was given an id that is already registered.
    AlreadyRegistered { client_id: String },
    /// The id is not in the registry.
    UnknownClient { client_id: String },
    /// The client queue is at capacity and its strategy is
    /// [`OverflowStrategy::Reject`](crate::OverflowStrategy::Reject).
    QueueFull {
        client_id: String,
        max_queue_depth: usize,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeight { client_id } => {
                write!(f, "client weight must be >= 1: {client_id}")
            }
            Self::AlreadyRegistered { client_id } => {
                write!(f, "client already registered: {client_id}")
            }
            Self::UnknownClient { client_id } => {
                write!(f, "unknown client: {client_id}")
            }
            Self::QueueFull {
                client_id,
                max_queue_depth,
            } => {
                write!(
                    f,
                    "queue full for client {client_id} (max depth: {max_queue_depth})"
                )
            }
        }
    }
}

impl std::error::Error for SchedulerError {}
