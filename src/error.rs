//! Error types for the gym check-in service.
//!
//! Every failure the check-in flow can report is a distinct variant of
//! [`GymError`], so callers can render one legible message per outcome.

use chrono::NaiveDate;
use thiserror::Error;

use crate::store::StoreError;

/// The main error type for the gym check-in service.
///
/// # Example
///
/// ```
/// use gym_checkin::error::GymError;
///
/// let error = GymError::UnregisteredMember {
///     identifier: "0x52908400098527886E0F7030069857D2E4169EE7".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "No member is registered for 0x52908400098527886E0F7030069857D2E4169EE7"
/// );
/// ```
#[derive(Debug, Error)]
pub enum GymError {
    /// The scanned text did not contain a member identifier.
    #[error("No member identifier found in the scanned code")]
    NoIdentifierFound,

    /// No member is registered under the identifier.
    #[error("No member is registered for {identifier}")]
    UnregisteredMember {
        /// The identifier that was looked up.
        identifier: String,
    },

    /// A period-based member already has an attendance record for the day.
    #[error("Member {identifier} has already checked in on {date}")]
    AlreadyCheckedInToday {
        /// The member's identifier.
        identifier: String,
        /// The local calendar day of the attempt.
        date: NaiveDate,
    },

    /// A session-based member has no sessions left to spend.
    #[error("Member {identifier} has no sessions remaining")]
    NoSessionsRemaining {
        /// The member's identifier.
        identifier: String,
    },

    /// The stored membership kind is not one this service understands.
    #[error("Unknown membership kind '{kind}' for member {identifier}")]
    UnknownMembershipKind {
        /// The member's identifier.
        identifier: String,
        /// The stored kind text.
        kind: String,
    },

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A registration request was rejected.
    #[error("Invalid registration field '{field}': {message}")]
    InvalidRegistration {
        /// The offending field.
        field: String,
        /// Why the field was rejected.
        message: String,
    },

    /// The identifier is already taken by another member.
    #[error("Member {identifier} is already registered")]
    MemberAlreadyRegistered {
        /// The duplicated identifier.
        identifier: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl GymError {
    /// Builds an [`GymError::InvalidRegistration`] for `field`.
    pub fn invalid_registration(field: impl Into<String>, message: impl Into<String>) -> Self {
        GymError::InvalidRegistration {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return GymError.
pub type GymResult<T> = Result<T, GymError>;
