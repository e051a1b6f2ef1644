use std::env;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub redis_url: Option<String>,
    pub worker_id: String,
    pub mail_sender: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            redis_url: env::var("REDIS_URL").ok(),
            worker_id: env::var("WORKER_ID")
                .unwrap_or_else(|_| format!("worker-{}", Uuid::new_v4())),
            mail_sender: env::var("MAIL_SENDER")
                .unwrap_or_else(|_| {
                    warn!("MAIL_SENDER not set, using default");
                    "Slotwise Team <noreply@slotwise.app>".to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.redis_url.is_some()
    }
}
