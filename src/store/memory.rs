//! In-process record store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::models::{AttendanceRecord, CheckInWindow, MembershipKind};

use super::{InsertOutcome, MemberRow, MemberStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    members: HashMap<String, MemberRow>,
    attendance: Vec<AttendanceRecord>,
}

/// A [`MemberStore`] kept in memory behind a mutex.
///
/// Every operation holds the lock for its whole check-and-write, which gives
/// the same atomicity as the SQLite constraints.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of attendance records held.
    pub fn attendance_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.attendance.len())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::new("memory store lock poisoned"))
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn find_member(&self, identifier: &str) -> StoreResult<Option<MemberRow>> {
        Ok(self.lock()?.members.get(identifier).cloned())
    }

    async fn list_members(&self) -> StoreResult<Vec<MemberRow>> {
        Ok(self.lock()?.members.values().cloned().collect())
    }

    async fn insert_member(&self, member: &MemberRow) -> StoreResult<InsertOutcome> {
        let mut tables = self.lock()?;
        if tables.members.contains_key(&member.identifier) {
            return Ok(InsertOutcome::Duplicate);
        }
        tables
            .members
            .insert(member.identifier.clone(), member.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn member_attendance(
        &self,
        identifier: &str,
        window: &CheckInWindow,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self
            .lock()?
            .attendance
            .iter()
            .filter(|r| r.member_identifier == identifier && window.contains(r.check_in_time))
            .cloned()
            .collect())
    }

    async fn attendance(&self, window: &CheckInWindow) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self
            .lock()?
            .attendance
            .iter()
            .filter(|r| window.contains(r.check_in_time))
            .cloned()
            .collect())
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<InsertOutcome> {
        let mut tables = self.lock()?;
        let day = record.check_in_day();
        let taken = tables
            .attendance
            .iter()
            .any(|r| r.member_identifier == record.member_identifier && r.check_in_day() == day);
        if taken {
            return Ok(InsertOutcome::Duplicate);
        }
        tables.attendance.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn decrement_sessions(&self, identifier: &str) -> StoreResult<Option<u32>> {
        let mut tables = self.lock()?;
        let Some(row) = tables.members.get_mut(identifier) else {
            return Ok(None);
        };
        if row.membership_kind.parse::<MembershipKind>() != Ok(MembershipKind::Session) {
            return Ok(None);
        }

        match row.remaining_sessions {
            Some(remaining) if remaining > 0 => {
                let next = remaining - 1;
                row.remaining_sessions = Some(next);
                Ok(Some(u32::try_from(next).unwrap_or(u32::MAX)))
            }
            _ => Ok(None),
        }
    }
}
