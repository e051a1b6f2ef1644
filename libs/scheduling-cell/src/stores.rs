use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::StoreError;

use crate::models::Appointment;

/// Relational store for appointments; owned by an external persistence
/// engine. The core only calls these named operations and never builds
/// storage queries itself.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// The active appointment occupying `(provider, hour)`, if any.
    async fn find_active_by_slot(
        &self,
        provider_id: Uuid,
        hour: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Active appointments owned by a client, ascending by date.
    /// `page` is 1-based.
    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Persist a new appointment. The store enforces at most one active
    /// appointment per `(provider, hour)` and reports a losing concurrent
    /// insert as `StoreError::UniqueViolation`.
    async fn insert(&self, appointment: &Appointment) -> Result<(), StoreError>;

    async fn update(&self, appointment: &Appointment) -> Result<(), StoreError>;
}
