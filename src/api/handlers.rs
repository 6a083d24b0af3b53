//! HTTP request handlers for the check-in API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::admin::AttendanceEntry;
use crate::checkin::RegistrationRequest;
use crate::error::GymError;
use crate::models::Member;

use super::request::{CheckInRequest, DaysQuery, LimitQuery};
use super::response::{
    ApiError, ApiErrorResponse, CheckInResponse, HealthResponse, MemberResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/members", post(register_handler))
        .route("/members/:identifier", get(member_handler))
        .route("/check-in", post(check_in_handler))
        .route("/admin/attendance/today", get(today_attendance_handler))
        .route("/admin/members", get(all_members_handler))
        .route("/admin/members/new", get(new_members_handler))
        .route("/admin/members/expiring", get(expiring_members_handler))
        .route("/admin/members/low-sessions", get(low_session_members_handler))
        .route("/admin/stats", get(stats_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, error: GymError) -> Response {
    match &error {
        GymError::Store(_) | GymError::UnknownMembershipKind { .. } => warn!(
            correlation_id = %correlation_id,
            error = %error,
            "Request failed"
        ),
        _ => info!(
            correlation_id = %correlation_id,
            error = %error,
            "Request rejected"
        ),
    }
    ApiErrorResponse::from(error).into_response()
}

/// Converts a JSON body rejection into an API error.
fn json_rejection_error(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // Serde's detail, including "missing field" messages.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            ApiError::malformed_json(body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error).into_response()
}

fn query_rejection_error(correlation_id: Uuid, rejection: QueryRejection) -> Response {
    let body_text = rejection.body_text();
    warn!(
        correlation_id = %correlation_id,
        error = %body_text,
        "Query string error"
    );
    ApiErrorResponse::bad_request(ApiError::invalid_query(body_text)).into_response()
}

/// Longest report range accepted over HTTP, about a century.
const MAX_REPORT_DAYS: i64 = 36_500;

/// Resolves a report range, rejecting negative and oversized values.
fn days_or_default(
    correlation_id: Uuid,
    query: Result<Query<DaysQuery>, QueryRejection>,
    default: i64,
) -> Result<i64, Response> {
    let Query(query) = query.map_err(|rejection| query_rejection_error(correlation_id, rejection))?;
    match query.days {
        Some(days) if days < 0 => Err(ApiErrorResponse::bad_request(ApiError::invalid_query(
            "days must not be negative",
        ))
        .into_response()),
        Some(days) if days > MAX_REPORT_DAYS => Err(ApiErrorResponse::bad_request(
            ApiError::invalid_query(format!("days must be at most {}", MAX_REPORT_DAYS)),
        )
        .into_response()),
        Some(days) => Ok(days),
        None => Ok(default),
    }
}

fn member_response(state: &AppState, member: Member) -> MemberResponse {
    MemberResponse {
        membership_status: member.status(state.checkin().clock().today()),
        member,
    }
}

fn member_responses(state: &AppState, members: Vec<Member>) -> Vec<MemberResponse> {
    members
        .into_iter()
        .map(|member| member_response(state, member))
        .collect()
}

/// Handler for GET /health.
async fn health_handler() -> impl IntoResponse {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok".to_string(),
        },
    )
}

/// Handler for POST /check-in.
///
/// Accepts the raw scanned text and returns the check-in outcome.
async fn check_in_handler(
    State(state): State<AppState>,
    payload: Result<Json<CheckInRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing check-in request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match state.checkin().check_in_scanned(&request.scanned_text).await {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                identifier = %outcome.identifier(),
                duration_us = start_time.elapsed().as_micros(),
                "Check-in completed"
            );
            json_response(StatusCode::OK, CheckInResponse::from(outcome))
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /members.
async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing registration request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_error(correlation_id, rejection),
    };

    match state.checkin().register(request).await {
        Ok(member) => json_response(StatusCode::CREATED, member_response(&state, member)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /members/:identifier.
async fn member_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    match state.checkin().resolve(&identifier).await {
        Ok(member) => json_response(StatusCode::OK, member_response(&state, member)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /admin/attendance/today.
async fn today_attendance_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();

    match state.admin().today_attendance().await {
        Ok(entries) => json_response::<Vec<AttendanceEntry>>(StatusCode::OK, entries),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /admin/members.
async fn all_members_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();

    match state.admin().all_members().await {
        Ok(members) => json_response(StatusCode::OK, member_responses(&state, members)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /admin/members/new?days=.
async fn new_members_handler(
    State(state): State<AppState>,
    query: Result<Query<DaysQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let default = state.admin().thresholds().new_member_days;
    let days = match days_or_default(correlation_id, query, default) {
        Ok(days) => days,
        Err(response) => return response,
    };

    match state.admin().new_members(days).await {
        Ok(members) => json_response(StatusCode::OK, member_responses(&state, members)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /admin/members/expiring?days=.
async fn expiring_members_handler(
    State(state): State<AppState>,
    query: Result<Query<DaysQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let default = state.admin().thresholds().expiring_within_days;
    let days = match days_or_default(correlation_id, query, default) {
        Ok(days) => days,
        Err(response) => return response,
    };

    match state.admin().expiring_members(days).await {
        Ok(members) => json_response(StatusCode::OK, member_responses(&state, members)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /admin/members/low-sessions?limit=.
async fn low_session_members_handler(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let limit = match query {
        Ok(Query(query)) => query
            .limit
            .unwrap_or(state.admin().thresholds().low_session_limit),
        Err(rejection) => return query_rejection_error(correlation_id, rejection),
    };

    match state.admin().low_session_members(limit).await {
        Ok(members) => json_response(StatusCode::OK, member_responses(&state, members)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /admin/stats.
async fn stats_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();

    match state.admin().stats().await {
        Ok(stats) => json_response(StatusCode::OK, stats),
        Err(err) => error_response(correlation_id, err),
    }
}
