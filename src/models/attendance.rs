//! Attendance records and the per-day check-in window.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One check-in event of a period-based member.
///
/// Times are local wall-clock times; the calendar day of `check_in_time`
/// is the day the record counts toward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Row id.
    pub id: Uuid,
    /// Identifier of the member who checked in.
    pub member_identifier: String,
    /// When the member checked in.
    pub check_in_time: NaiveDateTime,
}

impl AttendanceRecord {
    /// Creates a record with a fresh id.
    pub fn new(member_identifier: impl Into<String>, check_in_time: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_identifier: member_identifier.into(),
            check_in_time,
        }
    }

    /// Returns the local calendar day this record counts toward.
    pub fn check_in_day(&self) -> NaiveDate {
        self.check_in_time.date()
    }
}

/// Timestamp range used to detect an earlier check-in on the same day.
///
/// Both bounds are inclusive and the upper bound is `23:59:59` with no
/// fractional part, so a record in the last sub-second of the day falls
/// outside the window.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use gym_checkin::models::CheckInWindow;
///
/// let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
/// let window = CheckInWindow::for_day(day);
/// assert!(window.contains(day.and_hms_opt(0, 0, 0).unwrap()));
/// assert!(window.contains(day.and_hms_opt(23, 59, 59).unwrap()));
/// assert!(!window.contains(day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInWindow {
    /// First instant of the window.
    pub start: NaiveDateTime,
    /// Last instant of the window.
    pub end: NaiveDateTime,
}

impl CheckInWindow {
    /// Returns the window covering `day`.
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            start: day.and_time(NaiveTime::MIN),
            end: day
                .and_hms_opt(23, 59, 59)
                .expect("Valid end-of-day time"),
        }
    }

    /// Returns true if `time` falls inside the window.
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time <= self.end
    }
}
