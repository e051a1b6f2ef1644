use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use job_queue_cell::{InMemoryQueueBackend, JobQueue, QueueBackend, QueueError};
use notification_cell::{Notification, NotificationDispatcher, NotificationStore};
use scheduling_cell::{Appointment, AppointmentStore, SchedulingService};
use shared_models::{StoreError, User, UserStore};
use shared_utils::test_utils::FixedClock;

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    rows: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentStore {
    pub async fn all(&self) -> Vec<Appointment> {
        self.rows.lock().await.clone()
    }

    pub async fn seed(&self, appointment: Appointment) {
        self.rows.lock().await.push(appointment);
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find_active_by_slot(
        &self,
        provider_id: Uuid,
        hour: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|a| a.provider_id == provider_id && a.date == hour && a.is_active())
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.rows.lock().await.iter().find(|a| a.id == id).cloned())
    }

    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut rows: Vec<Appointment> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.is_active())
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.date);

        let offset = (page.saturating_sub(1) * page_size) as usize;
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<(), StoreError> {
        // Uniqueness on (provider, hour, active) checked under the same
        // lock as the write, the way a relational unique index would.
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|a| {
            a.provider_id == appointment.provider_id && a.date == appointment.date && a.is_active()
        }) {
            return Err(StoreError::UniqueViolation(format!(
                "provider {} already booked at {}",
                appointment.provider_id, appointment.date
            )));
        }
        rows.push(appointment.clone());
        Ok(())
    }

    async fn update(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or(StoreError::NotFound)?;
        *row = appointment.clone();
        Ok(())
    }
}

/// Always reports a slot as free, simulating two concurrent requests
/// whose availability reads both happened before either insert. Writes
/// still go through the wrapped store's uniqueness check.
pub struct StaleSlotReadStore {
    pub inner: Arc<InMemoryAppointmentStore>,
}

#[async_trait]
impl AppointmentStore for StaleSlotReadStore {
    async fn find_active_by_slot(
        &self,
        _provider_id: Uuid,
        _hour: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(None)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.inner.find_active_by_user(user_id, page, page_size).await
    }

    async fn insert(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.inner.insert(appointment).await
    }

    async fn update(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.inner.update(appointment).await
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub async fn add(&self, user: User) {
        self.users.lock().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_providers(&self) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .filter(|u| u.is_provider)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    rows: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub async fn all(&self) -> Vec<Notification> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError> {
        self.rows.lock().await.push(notification.clone());
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut rows: Vec<Notification> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|n| n.recipient_user_id == user_id)
            .cloned()
            .collect();
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn update_read(&self, id: Uuid) -> Result<Notification, StoreError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NotFound)?;
        row.read = true;
        Ok(row.clone())
    }
}

/// Backend whose accept is always rejected, for exercising the
/// queue-unavailable path.
pub struct RejectingQueueBackend;

#[async_trait]
impl QueueBackend for RejectingQueueBackend {
    async fn accept(&self, _job: &job_queue_cell::Job) -> Result<(), QueueError> {
        Err(QueueError::Unavailable("redis is down".to_string()))
    }

    async fn next(
        &self,
        _queue_key: &str,
        _worker_id: &str,
    ) -> Result<Option<job_queue_cell::Job>, QueueError> {
        Ok(None)
    }

    async fn mark_completed(&self, _job: &job_queue_cell::Job) -> Result<(), QueueError> {
        Ok(())
    }

    async fn mark_failed(
        &self,
        _job: &job_queue_cell::Job,
        _error_message: String,
    ) -> Result<(), QueueError> {
        Ok(())
    }
}

pub struct Harness {
    pub appointments: Arc<InMemoryAppointmentStore>,
    pub users: Arc<InMemoryUserStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub queue_backend: Arc<InMemoryQueueBackend>,
    pub clock: Arc<FixedClock>,
    pub service: SchedulingService,
}

impl Harness {
    pub fn new(now: DateTime<Utc>) -> Self {
        let appointments = Arc::new(InMemoryAppointmentStore::default());
        Self::with_appointment_store(now, appointments.clone(), appointments)
    }

    /// Build the service around a custom appointment store while keeping
    /// a handle on the backing in-memory rows.
    pub fn with_appointment_store(
        now: DateTime<Utc>,
        rows: Arc<InMemoryAppointmentStore>,
        store: Arc<dyn AppointmentStore>,
    ) -> Self {
        let users = Arc::new(InMemoryUserStore::default());
        let notifications = Arc::new(InMemoryNotificationStore::default());
        let queue_backend = Arc::new(InMemoryQueueBackend::new());
        let clock = Arc::new(FixedClock::at(now));

        let dispatcher = NotificationDispatcher::new(notifications.clone(), users.clone());
        let queue = JobQueue::new(queue_backend.clone());

        let service = SchedulingService::new(
            store,
            users.clone(),
            dispatcher,
            queue,
            clock.clone(),
        );

        Self {
            appointments: rows,
            users,
            notifications,
            queue_backend,
            clock,
            service,
        }
    }
}
