use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::User;

use crate::time::Clock;

/// Clock pinned to an explicit instant, advanced by hand from tests.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

pub fn client_user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        is_provider: false,
        avatar_url: None,
    }
}

pub fn provider_user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        is_provider: true,
        avatar_url: Some(format!("https://files.slotwise.app/avatars/{}.png", name.to_lowercase())),
    }
}
