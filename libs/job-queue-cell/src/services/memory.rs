use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::services::queue::QueueBackend;
use crate::{Job, JobStatus, QueueError};

/// Process-local queue backend for development and tests. Same contract
/// as the Redis backend, no durability across restarts.
#[derive(Default)]
pub struct InMemoryQueueBackend {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    pending: HashMap<String, VecDeque<Uuid>>,
    jobs: HashMap<Uuid, Job>,
}

impl InMemoryQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn job(&self, id: Uuid) -> Option<Job> {
        self.state.lock().await.jobs.get(&id).cloned()
    }

    pub async fn pending_len(&self, queue_key: &str) -> usize {
        self.state
            .lock()
            .await
            .pending
            .get(queue_key)
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueueBackend {
    async fn accept(&self, job: &Job) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        state.jobs.insert(job.id, job.clone());
        state
            .pending
            .entry(job.queue_key.clone())
            .or_default()
            .push_back(job.id);

        debug!("Job {} accepted on queue {}", job.id, job.queue_key);
        Ok(())
    }

    async fn next(&self, queue_key: &str, worker_id: &str) -> Result<Option<Job>, QueueError> {
        let mut state = self.state.lock().await;
        let Some(job_id) = state
            .pending
            .get_mut(queue_key)
            .and_then(VecDeque::pop_front)
        else {
            return Ok(None);
        };

        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;
        job.worker_id = Some(worker_id.to_string());
        job.status = JobStatus::Processing;
        job.updated_at = chrono::Utc::now();

        Ok(Some(job.clone()))
    }

    async fn mark_completed(&self, job: &Job) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let stored = state
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| QueueError::JobNotFound(job.id.to_string()))?;
        stored.status = JobStatus::Completed;
        stored.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, job: &Job, error_message: String) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let stored = state
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| QueueError::JobNotFound(job.id.to_string()))?;
        stored.status = JobStatus::Failed;
        stored.error_message = Some(error_message);
        stored.updated_at = chrono::Utc::now();
        Ok(())
    }
}
