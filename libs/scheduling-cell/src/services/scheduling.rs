use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use job_queue_cell::jobs::{CancellationMailPayload, CANCELLATION_MAIL_QUEUE};
use job_queue_cell::JobQueue;
use notification_cell::NotificationDispatcher;
use shared_models::{PublicProfile, StoreError, User, UserStore};
use shared_utils::time::{start_of_hour, Clock};

use crate::models::{Appointment, AppointmentView, CreateAppointmentRequest, SchedulingError};
use crate::services::availability::AvailabilityChecker;
use crate::stores::AppointmentStore;

/// Fixed page size for the client's appointment list.
pub const PAGE_SIZE: u32 = 20;

/// Creation and cancellation business rules. Orchestrates the
/// availability check, the stores, the notification dispatcher and the
/// job queue; all collaborators are injected.
pub struct SchedulingService {
    appointments: Arc<dyn AppointmentStore>,
    users: Arc<dyn UserStore>,
    availability: AvailabilityChecker,
    dispatcher: NotificationDispatcher,
    queue: JobQueue,
    clock: Arc<dyn Clock>,
}

impl SchedulingService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        users: Arc<dyn UserStore>,
        dispatcher: NotificationDispatcher,
        queue: JobQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let availability = AvailabilityChecker::new(Arc::clone(&appointments));

        Self {
            appointments,
            users,
            availability,
            dispatcher,
            queue,
            clock,
        }
    }

    /// Book a provider's slot for a client. On success one appointment
    /// row and one provider notification are written.
    pub async fn create(
        &self,
        client_user_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        let (provider_id, date) = request.validate()?;

        let client = self
            .users
            .find_by_id(client_user_id)
            .await?
            .ok_or_else(|| SchedulingError::Validation("unknown booking user".to_string()))?;

        if client.is_provider {
            return Err(SchedulingError::RoleConflict);
        }

        let provider = match self.users.find_by_id(provider_id).await? {
            Some(user) if user.is_provider => user,
            _ => return Err(SchedulingError::InvalidProvider),
        };

        let hour = start_of_hour(date);
        let now = self.clock.now();
        if hour <= now {
            return Err(SchedulingError::PastDate);
        }

        if !self.availability.is_available(provider_id, hour).await? {
            return Err(SchedulingError::SlotTaken);
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: client_user_id,
            provider_id,
            date: hour,
            canceled_at: None,
            created_at: now,
        };

        // The availability read above can race a concurrent booking for
        // the same slot; the store's (provider, hour, active) uniqueness
        // key decides the winner at write time.
        match self.appointments.insert(&appointment).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(_)) => {
                warn!(
                    "Concurrent booking won slot {} for provider {}",
                    hour, provider_id
                );
                return Err(SchedulingError::SlotTaken);
            }
            Err(e) => return Err(e.into()),
        }

        let content = format!(
            "New appointment from {} on {}",
            client.name,
            format_appointment_time(hour)
        );
        self.dispatcher
            .notify(provider.id, content)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        info!(
            "Appointment {} booked with provider {} at {}",
            appointment.id, provider_id, hour
        );
        Ok(appointment)
    }

    /// Active appointments for a client, ascending by date, enriched with
    /// each provider's public profile. `page` is 1-based.
    pub async fn list(
        &self,
        client_user_id: Uuid,
        page: u32,
    ) -> Result<Vec<AppointmentView>, SchedulingError> {
        let page = page.max(1);
        let appointments = self
            .appointments
            .find_active_by_user(client_user_id, page, PAGE_SIZE)
            .await?;

        let now = self.clock.now();
        let mut views = Vec::with_capacity(appointments.len());

        for appointment in appointments {
            let provider = self
                .users
                .find_by_id(appointment.provider_id)
                .await?
                .ok_or_else(|| {
                    SchedulingError::Store(format!(
                        "provider {} missing for appointment {}",
                        appointment.provider_id, appointment.id
                    ))
                })?;

            views.push(AppointmentView {
                id: appointment.id,
                date: appointment.date,
                past: appointment.is_past(now),
                cancelable: appointment.is_cancelable(now),
                provider: provider.public_profile(),
            });
        }

        Ok(views)
    }

    /// Cancel a booking. Only the original booker may cancel, and only
    /// while the 2-hour window is open. The cancellation-mail job is
    /// fire-and-forget relative to execution: cancellation is final once
    /// the store write lands, whatever happens to the email later.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        requesting_user_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointment = self
            .appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(SchedulingError::NotFound)?;

        if appointment.user_id != requesting_user_id {
            return Err(SchedulingError::Forbidden);
        }

        let now = self.clock.now();
        if !appointment.is_cancelable(now) {
            return Err(SchedulingError::CancellationWindow);
        }

        // Identities for rendering the cancellation notice
        let provider = self.require_user(appointment.provider_id).await?;
        let client = self.require_user(appointment.user_id).await?;

        appointment.canceled_at = Some(now);
        self.appointments.update(&appointment).await?;

        let payload = CancellationMailPayload {
            appointment_id: appointment.id,
            date: appointment.date,
            canceled_at: now,
            provider_name: provider.name,
            provider_email: provider.email,
            client_name: client.name,
        };
        let payload = serde_json::to_value(&payload)
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        self.queue
            .enqueue(CANCELLATION_MAIL_QUEUE, payload)
            .await
            .map_err(|e| SchedulingError::QueueUnavailable(e.to_string()))?;

        info!(
            "Appointment {} canceled by user {}",
            appointment.id, requesting_user_id
        );
        Ok(appointment)
    }

    /// Public profiles of every provider, for the booking screen.
    pub async fn list_providers(&self) -> Result<Vec<PublicProfile>, SchedulingError> {
        let providers = self.users.find_providers().await?;
        Ok(providers.iter().map(User::public_profile).collect())
    }

    async fn require_user(&self, id: Uuid) -> Result<User, SchedulingError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingError::Store(format!("user {} missing", id)))
    }
}

fn format_appointment_time(hour: DateTime<Utc>) -> String {
    hour.format("%B %-d at %-H:%M").to_string()
}
