//! Successful check-in outcomes.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The result of a successful check-in.
///
/// Failures are reported through [`GymError`](crate::error::GymError).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckInOutcome {
    /// A period-based member's attendance was logged.
    PeriodBased {
        /// The member's identifier.
        identifier: String,
        /// The member's display name.
        display_name: String,
        /// Local time of the new attendance record.
        check_in_time: NaiveDateTime,
    },
    /// A session-based member spent one session.
    SessionBased {
        /// The member's identifier.
        identifier: String,
        /// The member's display name.
        display_name: String,
        /// Sessions left after this check-in.
        remaining_sessions: u32,
    },
}

impl CheckInOutcome {
    /// Returns the identifier of the member who checked in.
    pub fn identifier(&self) -> &str {
        match self {
            CheckInOutcome::PeriodBased { identifier, .. }
            | CheckInOutcome::SessionBased { identifier, .. } => identifier,
        }
    }

    /// Returns the display name of the member who checked in.
    pub fn display_name(&self) -> &str {
        match self {
            CheckInOutcome::PeriodBased { display_name, .. }
            | CheckInOutcome::SessionBased { display_name, .. } => display_name,
        }
    }
}

impl fmt::Display for CheckInOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInOutcome::PeriodBased { .. } => write!(f, "Checked In (period-based)"),
            CheckInOutcome::SessionBased {
                remaining_sessions, ..
            } => write!(
                f,
                "Checked In (session-based, {} remaining)",
                remaining_sessions
            ),
        }
    }
}
