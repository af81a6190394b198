//! Time Provider Trait and Implementations
//!
//! Time abstraction so services can run against a fixed clock in tests and
//! the system clock in production.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

/// Source of the current time
pub trait TimeProvider: Send + Sync + std::fmt::Debug {
    /// Get the current UTC time
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get current time in a specific timezone
    fn now_in_timezone(&self, timezone: Tz) -> DateTime<Tz> {
        self.now_utc().with_timezone(&timezone)
    }

    /// Today's calendar date in a specific timezone
    fn today_in(&self, timezone: Tz) -> NaiveDate {
        self.now_in_timezone(timezone).date_naive()
    }

    /// Get current Unix timestamp (seconds since epoch)
    fn now_timestamp(&self) -> i64 {
        self.now_utc().timestamp()
    }
}

/// System time provider for production use
#[derive(Debug, Clone, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock time provider for testing. Clones share one clock.
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockTimeProvider {
    /// Create a new mock time provider starting from the given time
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time)),
        }
    }

    /// Advance the mock time by the specified duration
    pub fn advance(&self, duration: chrono::Duration) {
        if let Ok(mut time) = self.current_time.lock() {
            *time += duration;
        }
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(chrono::Duration::minutes(minutes));
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(chrono::Duration::days(days));
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        match self.current_time.lock() {
            Ok(time) => *time,
            // A poisoned lock still holds the last time that was set.
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
