//! SQLite-backed record store.
//!
//! Attendance times are stored as local wall-clock text whose string order
//! matches chronological order, so window queries compare text.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AttendanceRecord, CheckInWindow};

use super::{InsertOutcome, MemberRow, MemberStore, StoreError, StoreResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS members (
        id TEXT PRIMARY KEY,
        identifier TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        contact TEXT NOT NULL,
        membership_kind TEXT NOT NULL,
        remaining_sessions INTEGER,
        period_start TEXT,
        period_end TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS attendance (
        id TEXT PRIMARY KEY,
        member_identifier TEXT NOT NULL REFERENCES members(identifier),
        check_in_time TEXT NOT NULL,
        check_in_day TEXT NOT NULL,
        UNIQUE (member_identifier, check_in_day)
    )",
    "CREATE INDEX IF NOT EXISTS idx_attendance_check_in_time ON attendance (check_in_time)",
];

/// A [`MemberStore`] backed by an SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to the database at `url`.
    ///
    /// In-memory databases (`sqlite::memory:`) are pinned to a single
    /// long-lived connection, since each connection would otherwise see its
    /// own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = options.connect(url).await?;
        info!(url = %url, "Connected to member database");
        Ok(Self { pool })
    }

    /// Creates the tables and indexes if they do not exist.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Member database schema is up to date");
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MemberStore for SqliteStore {
    async fn find_member(&self, identifier: &str) -> StoreResult<Option<MemberRow>> {
        let row = sqlx::query("SELECT * FROM members WHERE identifier = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_member).transpose()
    }

    async fn list_members(&self) -> StoreResult<Vec<MemberRow>> {
        let rows = sqlx::query("SELECT * FROM members")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_member).collect()
    }

    async fn insert_member(&self, member: &MemberRow) -> StoreResult<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO members (
                id, identifier, display_name, contact, membership_kind,
                remaining_sessions, period_start, period_end, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (identifier) DO NOTHING",
        )
        .bind(member.id.to_string())
        .bind(&member.identifier)
        .bind(&member.display_name)
        .bind(&member.contact)
        .bind(&member.membership_kind)
        .bind(member.remaining_sessions)
        .bind(member.period_start.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(member.period_end.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(
            member
                .created_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        )
        .execute(&self.pool)
        .await?;

        Ok(insert_outcome(result.rows_affected()))
    }

    async fn member_attendance(
        &self,
        identifier: &str,
        window: &CheckInWindow,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM attendance
            WHERE member_identifier = ? AND check_in_time >= ? AND check_in_time <= ?
            ORDER BY check_in_time",
        )
        .bind(identifier)
        .bind(format_timestamp(window.start))
        .bind(format_timestamp(window.end))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(decode_attendance).collect()
    }

    async fn attendance(&self, window: &CheckInWindow) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM attendance
            WHERE check_in_time >= ? AND check_in_time <= ?
            ORDER BY check_in_time",
        )
        .bind(format_timestamp(window.start))
        .bind(format_timestamp(window.end))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(decode_attendance).collect()
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO attendance (id, member_identifier, check_in_time, check_in_day)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (member_identifier, check_in_day) DO NOTHING",
        )
        .bind(record.id.to_string())
        .bind(&record.member_identifier)
        .bind(format_timestamp(record.check_in_time))
        .bind(record.check_in_day().format(DATE_FORMAT).to_string())
        .execute(&self.pool)
        .await?;

        Ok(insert_outcome(result.rows_affected()))
    }

    async fn decrement_sessions(&self, identifier: &str) -> StoreResult<Option<u32>> {
        let row = sqlx::query(
            "UPDATE members SET remaining_sessions = remaining_sessions - 1
            WHERE identifier = ?
                AND lower(trim(membership_kind)) IN ('session', 'pt')
                AND remaining_sessions > 0
            RETURNING remaining_sessions",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> StoreResult<u32> {
            let remaining: i64 = row.try_get("remaining_sessions")?;
            u32::try_from(remaining)
                .map_err(|_| StoreError::new(format!("invalid session balance {}", remaining)))
        })
        .transpose()
    }
}

fn insert_outcome(rows_affected: u64) -> InsertOutcome {
    if rows_affected == 0 {
        InsertOutcome::Duplicate
    } else {
        InsertOutcome::Inserted
    }
}

fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_uuid(text: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(text).map_err(|e| StoreError::new(format!("invalid id '{}': {}", text, e)))
}

fn parse_date(text: Option<String>) -> StoreResult<Option<NaiveDate>> {
    text.map(|t| {
        NaiveDate::parse_from_str(&t, DATE_FORMAT)
            .map_err(|e| StoreError::new(format!("invalid date '{}': {}", t, e)))
    })
    .transpose()
}

fn decode_member(row: &SqliteRow) -> StoreResult<MemberRow> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(MemberRow {
        id: parse_uuid(&id)?,
        identifier: row.try_get("identifier")?,
        display_name: row.try_get("display_name")?,
        contact: row.try_get("contact")?,
        membership_kind: row.try_get("membership_kind")?,
        remaining_sessions: row.try_get("remaining_sessions")?,
        period_start: parse_date(row.try_get("period_start")?)?,
        period_end: parse_date(row.try_get("period_end")?)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::new(format!("invalid timestamp '{}': {}", created_at, e)))?
            .with_timezone(&Utc),
    })
}

fn decode_attendance(row: &SqliteRow) -> StoreResult<AttendanceRecord> {
    let id: String = row.try_get("id")?;
    let check_in_time: String = row.try_get("check_in_time")?;

    Ok(AttendanceRecord {
        id: parse_uuid(&id)?,
        member_identifier: row.try_get("member_identifier")?,
        check_in_time: NaiveDateTime::parse_from_str(&check_in_time, TIMESTAMP_FORMAT).map_err(
            |e| StoreError::new(format!("invalid timestamp '{}': {}", check_in_time, e)),
        )?,
    })
}
