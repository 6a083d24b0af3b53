//! HTTP API module for the gym check-in service.
//!
//! This module provides the REST endpoints for front-desk check-in,
//! member registration and the admin dashboard.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CheckInRequest, DaysQuery, LimitQuery};
pub use response::{ApiError, ApiErrorResponse, CheckInResponse, HealthResponse, MemberResponse};
pub use state::AppState;
