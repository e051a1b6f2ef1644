use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unit of deferred work, durably recorded by a queue backend and
/// consumed at most once by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub queue_key: String,
    pub payload: Value,
    pub status: JobStatus,
    pub worker_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(queue_key: &str, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            queue_key: queue_key.to_string(),
            payload,
            status: JobStatus::Queued,
            worker_id: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and Failed are both terminal: delivery is at-most-once
    /// and a failed job is never re-enqueued automatically.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub idle_poll_interval_ms: u64,
    pub error_backoff_seconds: u64,
    pub graceful_shutdown_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", Uuid::new_v4()),
            idle_poll_interval_ms: 100,
            error_backoff_seconds: 5,
            graceful_shutdown_timeout_seconds: 5,
        }
    }
}
