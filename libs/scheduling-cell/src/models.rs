use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{PublicProfile, StoreError};

/// Lead time a booker has to cancel before the appointment starts.
pub const CANCELLATION_WINDOW_HOURS: i64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    /// The booking client.
    pub user_id: Uuid,
    pub provider_id: Uuid,
    /// Slot instant, normalized to the start of the clock hour.
    pub date: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.canceled_at.is_none()
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date < now
    }

    /// Whether the cancellation window is still open at `now`.
    pub fn is_cancelable(&self, now: DateTime<Utc>) -> bool {
        now < self.date - Duration::hours(CANCELLATION_WINDOW_HOURS)
    }
}

/// Read-side projection for the client's appointment list, enriched with
/// the provider's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub past: bool,
    pub cancelable: bool,
    pub provider: PublicProfile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub provider_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
}

impl CreateAppointmentRequest {
    /// Explicit input validation, evaluated before any store access.
    pub fn validate(&self) -> Result<(Uuid, DateTime<Utc>), SchedulingError> {
        let provider_id = self
            .provider_id
            .ok_or_else(|| SchedulingError::Validation("provider_id is required".to_string()))?;
        let date = self
            .date
            .ok_or_else(|| SchedulingError::Validation("date is required".to_string()))?;
        Ok((provider_id, date))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Providers cannot create appointments")]
    RoleConflict,

    #[error("Appointments can only be created with providers")]
    InvalidProvider,

    #[error("Past dates are not permitted")]
    PastDate,

    #[error("Appointment date is not available")]
    SlotTaken,

    #[error("No permission to cancel this appointment")]
    Forbidden,

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointments can only be canceled at least 2 hours in advance")]
    CancellationWindow,

    #[error("Job queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        SchedulingError::Store(err.to_string())
    }
}
