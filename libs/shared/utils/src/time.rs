use chrono::{DateTime, Timelike, Utc};

/// Source of the current instant. Services take this injected instead of
/// calling `Utc::now()` directly so time-window rules stay testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Truncate an instant to the start of its clock hour. Booking slots are
/// keyed by whole hours; normalization happens once at the service
/// boundary and every downstream comparison uses hour equality.
pub fn start_of_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}
