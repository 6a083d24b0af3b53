//! Response types for the check-in API.
//!
//! This module defines the success bodies, the error body, and the mapping
//! from [`GymError`] to HTTP status codes.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::checkin::CheckInOutcome;
use crate::error::GymError;
use crate::models::{Member, MembershipStatus};

/// Body of a successful check-in.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInResponse {
    /// The outcome, flattened into the body.
    #[serde(flatten)]
    pub outcome: CheckInOutcome,
    /// Message for the front-desk display.
    pub message: String,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        let message = outcome.to_string();
        Self { outcome, message }
    }
}

/// A member together with its dashboard status.
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    /// The member, flattened into the body.
    #[serde(flatten)]
    pub member: Member,
    /// Status as of today.
    pub membership_status: MembershipStatus,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an invalid query string error response.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new("INVALID_QUERY", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a `400 Bad Request` response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<GymError> for ApiErrorResponse {
    fn from(error: GymError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            GymError::NoIdentifierFound => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "NO_IDENTIFIER_FOUND",
                    message,
                    "Expected 0x followed by 40 hex digits, optionally as an ethereum: URI",
                ),
            ),
            GymError::UnregisteredMember { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("UNREGISTERED_MEMBER", message),
            ),
            GymError::AlreadyCheckedInToday { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("ALREADY_CHECKED_IN_TODAY", message),
            ),
            GymError::NoSessionsRemaining { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("NO_SESSIONS_REMAINING", message),
            ),
            GymError::MemberAlreadyRegistered { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("MEMBER_ALREADY_REGISTERED", message),
            ),
            GymError::InvalidRegistration { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_REGISTRATION",
                    message,
                    format!("Field '{}' was rejected", field),
                ),
            ),
            GymError::UnknownMembershipKind { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("UNKNOWN_MEMBERSHIP_KIND", message),
            ),
            GymError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("STORE_ERROR", "Record store error", message),
            ),
            GymError::ConfigNotFound { .. } | GymError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}
