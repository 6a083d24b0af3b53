//! Request types for the check-in API.
//!
//! Registration bodies reuse [`RegistrationRequest`](crate::checkin::RegistrationRequest).

use serde::{Deserialize, Serialize};

/// Request body for `POST /check-in`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRequest {
    /// The raw text decoded from the member's code.
    pub scanned_text: String,
}

/// Query string of the look-back and look-ahead reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaysQuery {
    /// Range in days; the configured default when absent.
    #[serde(default)]
    pub days: Option<i64>,
}

/// Query string of the low-session report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    /// Highest balance to include; the configured default when absent.
    #[serde(default)]
    pub limit: Option<u32>,
}
