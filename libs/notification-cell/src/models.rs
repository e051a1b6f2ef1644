use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::StoreError;

/// In-app notice shown to a provider. Content is rendered once at
/// creation time; the record never stores structured fields for
/// re-rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_user_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient_user_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_user_id,
            content,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Only providers can load notifications")]
    NotProvider,

    #[error("Notification not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for NotificationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => NotificationError::NotFound,
            other => NotificationError::Store(other.to_string()),
        }
    }
}

/// Append-mostly document store for notifications; owned by an external
/// persistence engine.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError>;

    /// Most-recent-first, capped at `limit`.
    async fn find_by_user(&self, user_id: Uuid, limit: u32) -> Result<Vec<Notification>, StoreError>;

    /// Sets `read = true` and returns the updated record.
    async fn update_read(&self, id: Uuid) -> Result<Notification, StoreError>;
}
