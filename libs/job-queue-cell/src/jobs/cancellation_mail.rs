use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::services::worker::JobHandler;
use crate::Job;

pub const CANCELLATION_MAIL_QUEUE: &str = "cancellation_mail";

/// Snapshot of a cancelled appointment, captured at enqueue time so the
/// notice renders correctly even if the records change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationMailPayload {
    pub appointment_id: Uuid,
    pub date: DateTime<Utc>,
    pub canceled_at: DateTime<Utc>,
    pub provider_name: String,
    pub provider_email: String,
    pub client_name: String,
}

#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email transport is an external collaborator; the worker binary picks
/// the implementation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()>;
}

pub struct CancellationMailJob {
    mailer: Arc<dyn Mailer>,
}

impl CancellationMailJob {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl JobHandler for CancellationMailJob {
    fn queue_key(&self) -> &'static str {
        CANCELLATION_MAIL_QUEUE
    }

    async fn handle(&self, job: &Job) -> anyhow::Result<()> {
        let payload: CancellationMailPayload = serde_json::from_value(job.payload.clone())?;

        let message = MailMessage {
            to_name: payload.provider_name.clone(),
            to_email: payload.provider_email.clone(),
            subject: "Appointment canceled".to_string(),
            body: format!(
                "Hello {},\n\nThe appointment with {} on {} was canceled, so the slot is open again.",
                payload.provider_name,
                payload.client_name,
                payload.date.format("%B %-d at %-H:%M"),
            ),
        };

        self.mailer.send(message).await?;

        info!(
            "Cancellation notice for appointment {} sent to {}",
            payload.appointment_id, payload.provider_email
        );
        Ok(())
    }
}
