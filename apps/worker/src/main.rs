use std::sync::Arc;

use async_trait::async_trait;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_queue_cell::jobs::{CancellationMailJob, MailMessage, Mailer};
use job_queue_cell::{RedisQueueBackend, WorkerConfig, WorkerService};
use shared_config::AppConfig;

/// Operator-visible stand-in for a real mail transport: deliveries land
/// in the worker log. Swap in an SMTP-backed Mailer without touching the
/// job handler.
struct TracingMailer {
    sender: String,
}

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        info!(
            "MAIL from {} to {} <{}>: {} / {}",
            self.sender, message.to_name, message.to_email, message.subject, message.body
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting slotwise job worker");

    // Load configuration
    let config = AppConfig::from_env();

    let backend = Arc::new(RedisQueueBackend::connect(&config).await?);

    let mailer = Arc::new(TracingMailer {
        sender: config.mail_sender.clone(),
    });

    let worker_config = WorkerConfig {
        worker_id: config.worker_id.clone(),
        ..WorkerConfig::default()
    };

    let mut worker = WorkerService::new(worker_config, backend);
    worker.register(Arc::new(CancellationMailJob::new(mailer)));
    let worker = Arc::new(worker);

    let runner = Arc::clone(&worker);
    let handle = tokio::spawn(async move { runner.start().await });

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-c received, draining worker");

    worker.shutdown().await?;
    handle.await??;

    Ok(())
}
