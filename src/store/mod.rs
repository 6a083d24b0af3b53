//! Record store for members and attendance.
//!
//! The check-in service talks to persistence only through [`MemberStore`],
//! which is injected as `Arc<dyn MemberStore>`. Two implementations ship
//! with the crate:
//!
//! - [`SqliteStore`] backed by `sqlx` and SQLite;
//! - [`MemoryStore`], an in-process store used by tests and demos.
//!
//! Both implementations make the two check-in writes atomic: attendance rows
//! are unique per member and local day, and the session decrement only
//! applies while the balance is positive.

mod memory;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::error::GymError;
use crate::models::{AttendanceRecord, CheckInWindow, Member, Membership, MembershipKind};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A failure reported by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Store error: {message}")]
pub struct StoreError {
    /// Description of the underlying failure.
    pub message: String,
}

impl StoreError {
    /// Creates a store error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::new(error.to_string())
    }
}

/// A type alias for Results that return StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written.
    Inserted,
    /// A conflicting row already exists; nothing was written.
    Duplicate,
}

/// A member as stored: the kind as text and kind-specific columns nullable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    /// Row id.
    pub id: Uuid,
    /// Canonical identifier.
    pub identifier: String,
    /// Display name.
    pub display_name: String,
    /// Contact.
    pub contact: String,
    /// Stored membership kind.
    pub membership_kind: String,
    /// Remaining sessions, for session-based members.
    pub remaining_sessions: Option<i64>,
    /// Period start, for period-based members.
    pub period_start: Option<NaiveDate>,
    /// Period end, for period-based members.
    pub period_end: Option<NaiveDate>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<&Member> for MemberRow {
    fn from(member: &Member) -> Self {
        let (remaining_sessions, period_start, period_end) = match member.membership {
            Membership::SessionBased { remaining_sessions } => {
                (Some(i64::from(remaining_sessions)), None, None)
            }
            Membership::PeriodBased {
                period_start,
                period_end,
            } => (None, period_start, period_end),
        };

        MemberRow {
            id: member.id,
            identifier: member.identifier.clone(),
            display_name: member.display_name.clone(),
            contact: member.contact.clone(),
            membership_kind: member.kind().as_str().to_string(),
            remaining_sessions,
            period_start,
            period_end,
            created_at: member.created_at,
        }
    }
}

impl TryFrom<MemberRow> for Member {
    type Error = GymError;

    /// Converts a stored row into a member.
    ///
    /// A missing or negative session balance reads as zero.
    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let kind: MembershipKind =
            row.membership_kind
                .parse()
                .map_err(|kind| GymError::UnknownMembershipKind {
                    identifier: row.identifier.clone(),
                    kind,
                })?;

        let membership = match kind {
            MembershipKind::Session => Membership::SessionBased {
                remaining_sessions: row
                    .remaining_sessions
                    .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
                    .unwrap_or(0),
            },
            MembershipKind::Period => Membership::PeriodBased {
                period_start: row.period_start,
                period_end: row.period_end,
            },
        };

        Ok(Member {
            id: row.id,
            identifier: row.identifier,
            display_name: row.display_name,
            contact: row.contact,
            membership,
            created_at: row.created_at,
        })
    }
}

/// Persistence operations needed by the check-in and admin services.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Looks up a member by exact identifier.
    async fn find_member(&self, identifier: &str) -> StoreResult<Option<MemberRow>>;

    /// Returns every member, in no particular order.
    async fn list_members(&self) -> StoreResult<Vec<MemberRow>>;

    /// Inserts a member; `Duplicate` if the identifier is taken.
    async fn insert_member(&self, member: &MemberRow) -> StoreResult<InsertOutcome>;

    /// Returns a member's attendance records inside `window`.
    async fn member_attendance(
        &self,
        identifier: &str,
        window: &CheckInWindow,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// Returns all attendance records inside `window`.
    async fn attendance(&self, window: &CheckInWindow) -> StoreResult<Vec<AttendanceRecord>>;

    /// Inserts an attendance record; `Duplicate` if the member already has a
    /// record on the same local day.
    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<InsertOutcome>;

    /// Decrements a session-based member's balance if it is positive.
    ///
    /// Returns the new balance, or `None` when nothing was decremented.
    async fn decrement_sessions(&self, identifier: &str) -> StoreResult<Option<u32>>;
}
