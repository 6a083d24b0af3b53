//! Admin dashboard reports.
//!
//! These are read-only views over the record store: today's attendance,
//! member lists filtered for follow-up, and headline counts.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::AdminThresholds;
use crate::error::GymResult;
use crate::models::{AttendanceRecord, CheckInWindow, Member, Membership, MembershipKind};
use crate::store::{MemberRow, MemberStore};

/// An attendance record joined with its member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    /// The attendance record.
    pub record: AttendanceRecord,
    /// The member, if still registered.
    pub member: Option<Member>,
}

/// Headline counts for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberStats {
    /// All registered members.
    pub total_members: usize,
    /// Session-based members.
    pub session_members: usize,
    /// Period-based members.
    pub period_members: usize,
    /// Attendance records logged today.
    pub today_attendance: usize,
}

/// Computes dashboard reports.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn MemberStore>,
    clock: Arc<dyn Clock>,
    thresholds: AdminThresholds,
}

impl AdminService {
    /// Creates the service.
    pub fn new(
        store: Arc<dyn MemberStore>,
        clock: Arc<dyn Clock>,
        thresholds: AdminThresholds,
    ) -> Self {
        Self {
            store,
            clock,
            thresholds,
        }
    }

    /// Returns the configured default thresholds.
    pub fn thresholds(&self) -> &AdminThresholds {
        &self.thresholds
    }

    /// Today's attendance, newest first.
    ///
    /// Rows whose member cannot be read are still listed, without a member.
    pub async fn today_attendance(&self) -> GymResult<Vec<AttendanceEntry>> {
        let window = CheckInWindow::for_day(self.clock.today());
        let mut records = self.store.attendance(&window).await?;
        records.sort_by_key(|r| Reverse(r.check_in_time));

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let member = self
                .store
                .find_member(&record.member_identifier)
                .await?
                .and_then(readable_member);
            entries.push(AttendanceEntry { record, member });
        }
        Ok(entries)
    }

    /// Every member, newest registration first.
    pub async fn all_members(&self) -> GymResult<Vec<Member>> {
        let mut members = self.members().await?;
        members.sort_by_key(|m| Reverse(m.created_at));
        Ok(members)
    }

    /// Members registered within the last `days` days, newest first.
    ///
    /// A range reaching past the earliest representable time lists everyone.
    pub async fn new_members(&self, days: i64) -> GymResult<Vec<Member>> {
        let since = TimeDelta::try_days(days)
            .and_then(|range| self.clock.utc_now().checked_sub_signed(range));
        let members = self.all_members().await?;
        Ok(members
            .into_iter()
            .filter(|m| since.is_none_or(|since| m.created_at >= since))
            .collect())
    }

    /// Period members whose end date falls within the next `days` days,
    /// soonest first. Memberships that already ended are excluded.
    pub async fn expiring_members(&self, days: i64) -> GymResult<Vec<Member>> {
        let today = self.clock.today();
        let until = TimeDelta::try_days(days)
            .and_then(|range| today.checked_add_signed(range))
            .unwrap_or(NaiveDate::MAX);

        let mut expiring: Vec<Member> = self
            .members()
            .await?
            .into_iter()
            .filter(|m| match m.membership {
                Membership::PeriodBased {
                    period_end: Some(end),
                    ..
                } => today <= end && end <= until,
                _ => false,
            })
            .collect();
        expiring.sort_by_key(|m| match m.membership {
            Membership::PeriodBased { period_end, .. } => period_end,
            Membership::SessionBased { .. } => None,
        });
        Ok(expiring)
    }

    /// Session members with at most `limit` sessions left, fewest first.
    ///
    /// Members without a stored balance are left out.
    pub async fn low_session_members(&self, limit: u32) -> GymResult<Vec<Member>> {
        let mut low: Vec<Member> = self
            .store
            .list_members()
            .await?
            .into_iter()
            .filter(|row| row.remaining_sessions.is_some())
            .filter_map(readable_member)
            .filter(|m| m.remaining_sessions().is_some_and(|n| n <= limit))
            .collect();
        low.sort_by_key(|m| m.remaining_sessions());
        Ok(low)
    }

    /// Headline counts.
    ///
    /// `total_members` counts every stored row, including rows whose
    /// membership kind is unknown and so fall in neither kind count.
    pub async fn stats(&self) -> GymResult<MemberStats> {
        let rows = self.store.list_members().await?;
        let total_members = rows.len();
        let members: Vec<Member> = rows.into_iter().filter_map(readable_member).collect();
        let window = CheckInWindow::for_day(self.clock.today());
        let today_attendance = self.store.attendance(&window).await?.len();

        let stats = MemberStats {
            total_members,
            session_members: count_kind(&members, MembershipKind::Session),
            period_members: count_kind(&members, MembershipKind::Period),
            today_attendance,
        };
        debug!(?stats, "Computed member stats");
        Ok(stats)
    }

    /// Reads every member, skipping rows with an unknown membership kind.
    async fn members(&self) -> GymResult<Vec<Member>> {
        let rows = self.store.list_members().await?;
        Ok(rows.into_iter().filter_map(readable_member).collect())
    }
}

/// Converts a stored row, logging and skipping rows that cannot be read.
fn readable_member(row: MemberRow) -> Option<Member> {
    Member::try_from(row)
        .inspect_err(|err| warn!(error = %err, "Skipping unreadable member row"))
        .ok()
}

fn count_kind(members: &[Member], kind: MembershipKind) -> usize {
    members.iter().filter(|m| m.kind() == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::tests::{ADDRESS, member_row, morning};
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::Duration;

    const SECOND: &str = "0xde709f2102306220921060314715629080e2fb77";
    const THIRD: &str = "0x0000000000000000000000000000000000000001";

    fn create_admin(store: Arc<MemoryStore>) -> AdminService {
        let clock = Arc::new(FixedClock::at_local(morning()));
        AdminService::new(store, clock, AdminThresholds::default())
    }

    fn period_ending(identifier: &str, end: Option<NaiveDate>) -> MemberRow {
        MemberRow {
            period_end: end,
            ..member_row(identifier, "period", None)
        }
    }

    #[tokio::test]
    async fn test_today_attendance_is_joined_and_newest_first() {
        let store = Arc::new(MemoryStore::new());
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();
        store.insert_member(&member_row(SECOND, "period", None)).await.unwrap();
        let day = morning().date();
        store
            .insert_attendance(&AttendanceRecord::new(ADDRESS, day.and_hms_opt(6, 0, 0).unwrap()))
            .await
            .unwrap();
        store
            .insert_attendance(&AttendanceRecord::new(SECOND, day.and_hms_opt(7, 0, 0).unwrap()))
            .await
            .unwrap();
        store
            .insert_attendance(&AttendanceRecord::new(
                ADDRESS,
                day.pred_opt().unwrap().and_hms_opt(7, 0, 0).unwrap(),
            ))
            .await
            .unwrap();

        let entries = create_admin(store).today_attendance().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record.member_identifier, SECOND);
        assert_eq!(
            entries[1].member.as_ref().map(|m| m.identifier.as_str()),
            Some(ADDRESS)
        );
    }

    #[tokio::test]
    async fn test_new_members_uses_look_back_window() {
        let store = Arc::new(MemoryStore::new());
        let now = morning().and_utc();
        store
            .insert_member(&MemberRow {
                created_at: now - Duration::days(2),
                ..member_row(ADDRESS, "session", Some(10))
            })
            .await
            .unwrap();
        store
            .insert_member(&MemberRow {
                created_at: now - Duration::days(30),
                ..member_row(SECOND, "session", Some(10))
            })
            .await
            .unwrap();

        let admin = create_admin(store);
        let recent = admin.new_members(7).await.unwrap();
        let all = admin.all_members().await.unwrap();

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].identifier, ADDRESS);
        assert_eq!(all[1].identifier, SECOND);
    }

    #[tokio::test]
    async fn test_expiring_members_excludes_ended_and_far_off() {
        let store = Arc::new(MemoryStore::new());
        let today = morning().date();
        store
            .insert_member(&period_ending(ADDRESS, Some(today + Duration::days(5))))
            .await
            .unwrap();
        store
            .insert_member(&period_ending(SECOND, Some(today - Duration::days(1))))
            .await
            .unwrap();
        store
            .insert_member(&period_ending(THIRD, Some(today)))
            .await
            .unwrap();

        let expiring = create_admin(store).expiring_members(7).await.unwrap();

        let ids: Vec<&str> = expiring.iter().map(|m| m.identifier.as_str()).collect();
        assert_eq!(ids, vec![THIRD, ADDRESS]);
    }

    #[tokio::test]
    async fn test_low_session_members_sorted_ascending() {
        let store = Arc::new(MemoryStore::new());
        store.insert_member(&member_row(ADDRESS, "session", Some(5))).await.unwrap();
        store.insert_member(&member_row(SECOND, "session", Some(2))).await.unwrap();
        store.insert_member(&member_row(THIRD, "session", Some(20))).await.unwrap();

        let low = create_admin(store).low_session_members(5).await.unwrap();

        let ids: Vec<&str> = low.iter().map(|m| m.identifier.as_str()).collect();
        assert_eq!(ids, vec![SECOND, ADDRESS]);
    }

    #[tokio::test]
    async fn test_stats_counts_kinds_and_today() {
        let store = Arc::new(MemoryStore::new());
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();
        store.insert_member(&member_row(SECOND, "session", Some(4))).await.unwrap();
        store.insert_member(&member_row(THIRD, "free", None)).await.unwrap();
        store
            .insert_attendance(&AttendanceRecord::new(ADDRESS, morning()))
            .await
            .unwrap();

        let stats = create_admin(store).stats().await.unwrap();

        assert_eq!(
            stats,
            MemberStats {
                total_members: 3,
                session_members: 1,
                period_members: 2,
                today_attendance: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_unbounded_ranges_do_not_overflow() {
        let store = Arc::new(MemoryStore::new());
        let today = morning().date();
        store
            .insert_member(&MemberRow {
                created_at: morning().and_utc() - Duration::days(4000),
                ..period_ending(ADDRESS, Some(today + Duration::days(5)))
            })
            .await
            .unwrap();

        let admin = create_admin(store);

        for days in [1_000_000_000, i64::MAX] {
            let recent = admin.new_members(days).await.unwrap();
            let expiring = admin.expiring_members(days).await.unwrap();
            assert_eq!(recent.len(), 1);
            assert_eq!(expiring.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_low_session_members_skip_missing_balance() {
        let store = Arc::new(MemoryStore::new());
        store.insert_member(&member_row(ADDRESS, "session", None)).await.unwrap();
        store.insert_member(&member_row(SECOND, "session", Some(0))).await.unwrap();

        let low = create_admin(store).low_session_members(5).await.unwrap();

        let ids: Vec<&str> = low.iter().map(|m| m.identifier.as_str()).collect();
        assert_eq!(ids, vec![SECOND]);
    }

    #[tokio::test]
    async fn test_stats_total_includes_unknown_kinds() {
        let store = Arc::new(MemoryStore::new());
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();
        store.insert_member(&member_row(SECOND, "session", Some(4))).await.unwrap();
        store.insert_member(&member_row(THIRD, "vip", None)).await.unwrap();

        let admin = create_admin(store);
        let stats = admin.stats().await.unwrap();

        assert_eq!(stats.total_members, 3);
        assert_eq!(stats.session_members + stats.period_members, 2);
        assert_eq!(admin.all_members().await.unwrap().len(), 2);
    }
}
