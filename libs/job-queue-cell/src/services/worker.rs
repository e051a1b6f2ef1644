use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::services::queue::QueueBackend;
use crate::{Job, QueueError, WorkerConfig};

/// Consumes jobs for a single queue key. One handler per key.
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn queue_key(&self) -> &'static str;

    async fn handle(&self, job: &Job) -> anyhow::Result<()>;
}

/// Polls the queue backend and dispatches jobs to registered handlers,
/// one consumer loop per queue key. Handler execution is isolated per
/// job: a failing job is reported and marked failed, nothing else.
#[derive(Clone)]
pub struct WorkerService {
    config: WorkerConfig,
    backend: Arc<dyn QueueBackend>,
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    is_shutdown: Arc<RwLock<bool>>,
}

impl WorkerService {
    pub fn new(config: WorkerConfig, backend: Arc<dyn QueueBackend>) -> Self {
        Self {
            config,
            backend,
            handlers: HashMap::new(),
            is_shutdown: Arc::new(RwLock::new(false)),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let key = handler.queue_key().to_string();
        if self.handlers.insert(key.clone(), handler).is_some() {
            warn!("Replacing existing handler for queue {}", key);
        }
    }

    pub async fn start(&self) -> Result<(), QueueError> {
        info!("Starting job worker {}", self.config.worker_id);

        let mut handles = Vec::new();

        for queue_key in self.handlers.keys() {
            let worker = self.clone();
            let queue_key = queue_key.clone();

            let handle = tokio::spawn(async move { worker.consume_loop(queue_key).await });
            handles.push(handle);
        }

        tokio::select! {
            _ = self.wait_for_shutdown() => {
                info!("Shutdown signal received, stopping worker {}", self.config.worker_id);
            }
            _ = futures::future::try_join_all(handles) => {
                warn!("All consumer loops completed unexpectedly");
            }
        }

        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), QueueError> {
        info!("Initiating graceful shutdown for worker {}", self.config.worker_id);

        let mut is_shutdown = self.is_shutdown.write().await;
        *is_shutdown = true;
        drop(is_shutdown);

        // Give in-flight handlers time to finish
        let drain = Duration::from_secs(self.config.graceful_shutdown_timeout_seconds);
        tokio::time::sleep(drain).await;

        info!("Worker {} shutdown complete", self.config.worker_id);
        Ok(())
    }

    /// Process at most one job from the given queue. Returns whether a
    /// job was claimed. Handler failures are not propagated: the job is
    /// marked failed and the failure logged for operators. Delivery is
    /// at-most-once; a retry policy, if one is ever wanted, slots in at
    /// the mark_failed call below.
    pub async fn process_next(&self, queue_key: &str) -> Result<bool, QueueError> {
        let handler = self
            .handlers
            .get(queue_key)
            .ok_or_else(|| QueueError::UnknownQueue(queue_key.to_string()))?;

        let Some(job) = self.backend.next(queue_key, &self.config.worker_id).await? else {
            return Ok(false);
        };

        debug!(
            "Worker {} processing job {} from queue {}",
            self.config.worker_id, job.id, queue_key
        );

        match handler.handle(&job).await {
            Ok(()) => {
                self.backend.mark_completed(&job).await?;
                info!("Job {} completed on queue {}", job.id, queue_key);
            }
            Err(e) => {
                error!("Queue {}: FAILED job {}: {:#}", queue_key, job.id, e);
                self.backend.mark_failed(&job, format!("{:#}", e)).await?;
            }
        }

        Ok(true)
    }

    async fn consume_loop(&self, queue_key: String) -> Result<(), QueueError> {
        debug!("Consumer loop started for queue {}", queue_key);

        loop {
            if *self.is_shutdown.read().await {
                debug!("Consumer loop for queue {} received shutdown signal", queue_key);
                break;
            }

            match self.process_next(&queue_key).await {
                Ok(true) => {}
                Ok(false) => {
                    // No jobs available, sleep briefly
                    tokio::time::sleep(Duration::from_millis(self.config.idle_poll_interval_ms))
                        .await;
                }
                Err(e) => {
                    error!(
                        "Worker {} failed to poll queue {}: {}",
                        self.config.worker_id, queue_key, e
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.error_backoff_seconds))
                        .await;
                }
            }
        }

        debug!("Consumer loop ended for queue {}", queue_key);
        Ok(())
    }

    async fn wait_for_shutdown(&self) {
        loop {
            if *self.is_shutdown.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
