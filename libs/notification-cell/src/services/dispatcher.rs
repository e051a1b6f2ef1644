use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_models::UserStore;

use crate::models::{Notification, NotificationError, NotificationStore};

/// Page cap for the notification feed.
pub const NOTIFICATION_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    users: Arc<dyn UserStore>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, users: Arc<dyn UserStore>) -> Self {
        Self { store, users }
    }

    /// Synchronously append a notification with fully rendered content.
    pub async fn notify(
        &self,
        recipient_user_id: Uuid,
        content: String,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification::new(recipient_user_id, content);
        self.store.insert(&notification).await?;

        debug!(
            "Notification {} recorded for user {}",
            notification.id, recipient_user_id
        );
        Ok(notification)
    }

    /// Newest-first feed, providers only.
    pub async fn list(&self, provider_user_id: Uuid) -> Result<Vec<Notification>, NotificationError> {
        let is_provider = self
            .users
            .find_by_id(provider_user_id)
            .await?
            .is_some_and(|user| user.is_provider);

        if !is_provider {
            return Err(NotificationError::NotProvider);
        }

        Ok(self
            .store
            .find_by_user(provider_user_id, NOTIFICATION_PAGE_SIZE)
            .await?)
    }

    /// Idempotent: marking an already-read notification is a no-op that
    /// still returns the record.
    pub async fn mark_read(&self, id: Uuid) -> Result<Notification, NotificationError> {
        let notification = self.store.update_read(id).await?;
        Ok(notification)
    }
}
