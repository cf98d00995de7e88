//! Move-only job descriptor.
//!
//! A [`Job`] pairs an opaque callable with the scheduling metadata the
//! arbiter needs: the owning client, a monotonically increasing id, a cost
//! hint for cost-aware policies, and the enqueue instant. The scheduler
//! never inspects the callable; capturing state is the submitter's
//! responsibility.
//!
//! # Ownership
//!
//! A job is owned by exactly one container at a time: the submitter's
//! stack, a client queue, or a worker's local slot. Owning a `Box<dyn
//! FnOnce()>` makes the type move-only by construction; there is no way to
//! copy one.

use std::time::Instant;

/// One unit of work plus its scheduling metadata.
pub struct Job {
    client_id: String,
    task: Box<dyn FnOnce() + Send + 'static>,
    enqueue_time: Instant,
    job_id: u64,
    cost_hint: u32,
}

impl Job {
    /// Build a job for `client_id`. The enqueue instant is stamped here;
    /// `job_id` is assigned by the scheduler at submission.
    pub(crate) fn new(
        client_id: String,
        task: Box<dyn FnOnce() + Send + 'static>,
        job_id: u64,
        cost_hint: u32,
    ) -> Self {
        Self {
            client_id,
            task,
            enqueue_time: Instant::now(),
            job_id,
            cost_hint,
        }
    }

    /// Id of the client that submitted this job.
    #[inline]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Monotonic submission id, starting at 1.
    #[inline]
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// Cost units charged by cost-aware policies per dequeue. Always >= 1;
    /// WRR ignores it.
    #[inline]
    pub fn cost_hint(&self) -> u32 {
        self.cost_hint
    }

    /// Instant the job was constructed at submission time.
    #[inline]
    pub fn enqueue_time(&self) -> Instant {
        self.enqueue_time
    }

    /// Consume the job and invoke its callable.
    #[inline]
    pub fn run(self) {
        (self.task)();
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("client_id", &self.client_id)
            .field("job_id", &self.job_id)
            .field("cost_hint", &self.cost_hint)
            .field("enqueue_time", &self.enqueue_time)
            .finish_non_exhaustive()
    }
}
