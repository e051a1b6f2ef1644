use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{Job, QueueError};

/// Durable storage side of the queue. Backends only record and hand out
/// jobs; dispatching to handlers is the worker's concern.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Durably record a job. Returns once the backend has accepted it,
    /// without waiting for execution.
    async fn accept(&self, job: &Job) -> Result<(), QueueError>;

    /// Claim the next pending job on a queue for `worker_id`, if any.
    async fn next(&self, queue_key: &str, worker_id: &str) -> Result<Option<Job>, QueueError>;

    async fn mark_completed(&self, job: &Job) -> Result<(), QueueError>;

    async fn mark_failed(&self, job: &Job, error_message: String) -> Result<(), QueueError>;
}

/// Producer-side handle services use to hand work off the request path.
#[derive(Clone)]
pub struct JobQueue {
    backend: Arc<dyn QueueBackend>,
}

impl JobQueue {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    /// Enqueue is fire-and-forget relative to execution: the only failure
    /// surfaced here is a rejected accept, never a handler outcome.
    pub async fn enqueue(&self, queue_key: &str, payload: Value) -> Result<Job, QueueError> {
        let job = Job::new(queue_key, payload);
        self.backend.accept(&job).await?;

        debug!("Job {} enqueued on queue {}", job.id, queue_key);
        Ok(job)
    }
}
