use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::StoreError;

use crate::stores::AppointmentStore;

/// Decides whether a provider is free at a given hour. The input must
/// already be normalized to the start of the hour; normalization is the
/// caller's responsibility, applied once at the service boundary.
#[derive(Clone)]
pub struct AvailabilityChecker {
    appointments: Arc<dyn AppointmentStore>,
}

impl AvailabilityChecker {
    pub fn new(appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { appointments }
    }

    pub async fn is_available(
        &self,
        provider_id: Uuid,
        hour: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let existing = self.appointments.find_active_by_slot(provider_id, hour).await?;
        Ok(existing.is_none())
    }
}
