use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::services::queue::QueueBackend;
use crate::{Job, JobStatus, QueueError};
use shared_config::AppConfig;

// Job hashes expire after 7 days; terminal jobs are kept that long for
// operator inspection.
const JOB_TTL_SECONDS: i64 = 604_800;

pub struct RedisQueueBackend {
    pool: Pool,
}

impl RedisQueueBackend {
    pub async fn connect(config: &AppConfig) -> Result<Self, QueueError> {
        let redis_url = config
            .redis_url
            .clone()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());

        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| QueueError::Unavailable(format!("Failed to create Redis pool: {}", e)))?;

        // Test connection
        let mut conn = pool
            .get()
            .await
            .map_err(|e| QueueError::Unavailable(format!("Failed to connect to Redis: {}", e)))?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Redis queue backend initialized successfully");
        Ok(Self { pool })
    }

    fn job_key(job: &Job) -> String {
        format!("job:{}", job.id)
    }

    fn pending_key(queue_key: &str) -> String {
        format!("queue:{}:pending", queue_key)
    }

    fn processing_key(queue_key: &str) -> String {
        format!("queue:{}:processing", queue_key)
    }

    async fn get_connection(&self) -> Result<Connection, QueueError> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::Unavailable(format!("Failed to get Redis connection: {}", e)))
    }

    async fn store_job(&self, conn: &mut Connection, job: &Job) -> Result<(), QueueError> {
        let job_key = Self::job_key(job);
        let job_data = serde_json::to_string(job)?;

        let _: () = conn
            .hset_multiple(
                &job_key,
                &[
                    ("data", job_data.as_str()),
                    ("status", &serde_json::to_string(&job.status)?),
                    ("updated_at", &job.updated_at.to_rfc3339()),
                ],
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl QueueBackend for RedisQueueBackend {
    async fn accept(&self, job: &Job) -> Result<(), QueueError> {
        let mut conn = self.get_connection().await?;

        self.store_job(&mut conn, job).await?;

        let job_key = Self::job_key(job);
        let _: () = conn.expire(&job_key, JOB_TTL_SECONDS).await?;

        let _: () = conn
            .lpush(Self::pending_key(&job.queue_key), job.id.to_string())
            .await?;

        debug!("Job {} accepted on queue {}", job.id, job.queue_key);
        Ok(())
    }

    async fn next(&self, queue_key: &str, worker_id: &str) -> Result<Option<Job>, QueueError> {
        let mut conn = self.get_connection().await?;

        // Atomic pop from pending and push to processing
        let job_id: Option<String> = conn
            .brpoplpush(
                Self::pending_key(queue_key),
                Self::processing_key(queue_key),
                1.0,
            )
            .await?;

        let Some(job_id) = job_id else {
            return Ok(None);
        };

        let job_data: Option<String> = conn.hget(format!("job:{}", job_id), "data").await?;
        let Some(data) = job_data else {
            // Hash expired while the id sat in the pending list
            let _: () = conn
                .lrem(Self::processing_key(queue_key), 1, &job_id)
                .await?;
            return Err(QueueError::JobNotFound(job_id));
        };

        let mut job: Job = serde_json::from_str(&data)?;
        job.worker_id = Some(worker_id.to_string());
        job.status = JobStatus::Processing;
        job.updated_at = chrono::Utc::now();

        self.store_job(&mut conn, &job).await?;

        debug!("Job {} claimed by worker {}", job.id, worker_id);
        Ok(Some(job))
    }

    async fn mark_completed(&self, job: &Job) -> Result<(), QueueError> {
        let mut conn = self.get_connection().await?;

        let _: () = conn
            .lrem(Self::processing_key(&job.queue_key), 1, job.id.to_string())
            .await?;

        let mut completed = job.clone();
        completed.status = JobStatus::Completed;
        completed.updated_at = chrono::Utc::now();
        self.store_job(&mut conn, &completed).await?;

        debug!("Job {} marked completed", job.id);
        Ok(())
    }

    async fn mark_failed(&self, job: &Job, error_message: String) -> Result<(), QueueError> {
        let mut conn = self.get_connection().await?;

        let _: () = conn
            .lrem(Self::processing_key(&job.queue_key), 1, job.id.to_string())
            .await?;

        let mut failed = job.clone();
        failed.status = JobStatus::Failed;
        failed.error_message = Some(error_message);
        failed.updated_at = chrono::Utc::now();
        self.store_job(&mut conn, &failed).await?;

        debug!("Job {} marked failed", job.id);
        Ok(())
    }
}
