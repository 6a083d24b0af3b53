//! Time source for check-in decisions.
//!
//! The check-in rules depend on "today" in the gym's local time. The
//! [`Clock`] trait lets the service read the current time from the system in
//! production and from a [`FixedClock`] in tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant with the local UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Returns the current local wall-clock time.
    fn local_now(&self) -> NaiveDateTime {
        self.now().naive_local()
    }

    /// Returns the current local calendar date.
    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Returns the current instant in UTC.
    fn utc_now(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Reads the system clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A manually driven clock.
///
/// # Example
///
/// ```
/// use chrono::{Duration, NaiveDate};
/// use gym_checkin::clock::{Clock, FixedClock};
///
/// let start = NaiveDate::from_ymd_opt(2026, 10, 17)
///     .unwrap()
///     .and_hms_opt(9, 0, 0)
///     .unwrap();
/// let clock = FixedClock::at_local(start);
/// clock.advance(Duration::days(1));
/// assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Creates a clock frozen at the given wall-clock time, at UTC+0.
    pub fn at_local(local: NaiveDateTime) -> Self {
        Self::new(local.and_utc().fixed_offset())
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.lock() = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        // The guarded value is a plain timestamp, so a poisoned lock is still usable.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }
}
