//! Check-in decision procedure and member registration.
//!
//! [`CheckInService`] resolves a scanned identifier to a member and applies
//! the rule for that member's kind of membership:
//!
//! - period-based members get one attendance record per local calendar day;
//! - session-based members spend one session per check-in, never going
//!   below zero.
//!
//! Every rejection is a distinct [`GymError`] variant and no rejection leaves
//! a partial write behind.

mod outcome;
mod registration;

use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::ConfigLoader;
use crate::error::{GymError, GymResult};
use crate::identifier::extract_identifier;
use crate::models::{AttendanceRecord, CheckInWindow, Member, Membership};
use crate::store::{InsertOutcome, MemberStore};

pub use outcome::CheckInOutcome;
pub use registration::{MembershipPlan, RegistrationRequest};

/// Runs check-ins and registrations against an injected store and clock.
#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn MemberStore>,
    clock: Arc<dyn Clock>,
    config: Arc<ConfigLoader>,
}

impl CheckInService {
    /// Creates a service over the given store, clock and configuration.
    pub fn new(store: Arc<dyn MemberStore>, clock: Arc<dyn Clock>, config: ConfigLoader) -> Self {
        Self {
            store,
            clock,
            config: Arc::new(config),
        }
    }

    /// Returns the record store.
    pub fn store(&self) -> &Arc<dyn MemberStore> {
        &self.store
    }

    /// Returns the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Looks up the member registered under `identifier`.
    ///
    /// Fails with `UnregisteredMember` when there is none.
    pub async fn resolve(&self, identifier: &str) -> GymResult<Member> {
        let row = self
            .store
            .find_member(identifier)
            .await?
            .ok_or_else(|| GymError::UnregisteredMember {
                identifier: identifier.to_string(),
            })?;
        Member::try_from(row)
    }

    /// Extracts the identifier from scanned text and checks the member in.
    ///
    /// Fails with `NoIdentifierFound` when the text carries no identifier.
    pub async fn check_in_scanned(&self, scanned_text: &str) -> GymResult<CheckInOutcome> {
        let Some(identifier) = extract_identifier(scanned_text) else {
            warn!(scanned_len = scanned_text.len(), "No identifier in scanned code");
            return Err(GymError::NoIdentifierFound);
        };
        self.check_in(identifier).await
    }

    /// Checks in the member registered under `identifier`.
    pub async fn check_in(&self, identifier: &str) -> GymResult<CheckInOutcome> {
        let member = self.resolve(identifier).await.inspect_err(|err| {
            warn!(identifier = %identifier, error = %err, "Check-in lookup failed");
        })?;

        match member.membership {
            Membership::PeriodBased { .. } => self.check_in_period(&member).await,
            Membership::SessionBased { .. } => self.check_in_session(&member).await,
        }
    }

    async fn check_in_period(&self, member: &Member) -> GymResult<CheckInOutcome> {
        let now = self.clock.local_now();
        let today = now.date();
        let window = CheckInWindow::for_day(today);

        let already_checked_in = GymError::AlreadyCheckedInToday {
            identifier: member.identifier.clone(),
            date: today,
        };

        let existing = self
            .store
            .member_attendance(&member.identifier, &window)
            .await?;
        if !existing.is_empty() {
            warn!(
                identifier = %member.identifier,
                date = %today,
                "Rejected duplicate check-in"
            );
            return Err(already_checked_in);
        }

        let record = AttendanceRecord::new(&member.identifier, now);
        match self.store.insert_attendance(&record).await? {
            InsertOutcome::Inserted => {
                info!(
                    identifier = %member.identifier,
                    check_in_time = %record.check_in_time,
                    "Period member checked in"
                );
                Ok(CheckInOutcome::PeriodBased {
                    identifier: member.identifier.clone(),
                    display_name: member.display_name.clone(),
                    check_in_time: record.check_in_time,
                })
            }
            InsertOutcome::Duplicate => {
                // Another check-in for the same day committed after our window query.
                warn!(
                    identifier = %member.identifier,
                    date = %today,
                    "Rejected concurrent duplicate check-in"
                );
                Err(already_checked_in)
            }
        }
    }

    async fn check_in_session(&self, member: &Member) -> GymResult<CheckInOutcome> {
        match self.store.decrement_sessions(&member.identifier).await? {
            Some(remaining_sessions) => {
                info!(
                    identifier = %member.identifier,
                    remaining_sessions,
                    "Session member checked in"
                );
                Ok(CheckInOutcome::SessionBased {
                    identifier: member.identifier.clone(),
                    display_name: member.display_name.clone(),
                    remaining_sessions,
                })
            }
            None => {
                warn!(identifier = %member.identifier, "No sessions remaining");
                Err(GymError::NoSessionsRemaining {
                    identifier: member.identifier.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::{MemberRow, MemoryStore};
    use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
    use uuid::Uuid;

    pub(crate) const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    pub(crate) fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    pub(crate) fn create_test_service() -> (CheckInService, Arc<MemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at_local(morning()));
        let service = CheckInService::new(store.clone(), clock.clone(), ConfigLoader::default());
        (service, store, clock)
    }

    pub(crate) fn member_row(identifier: &str, kind: &str, remaining: Option<i64>) -> MemberRow {
        MemberRow {
            id: Uuid::new_v4(),
            identifier: identifier.to_string(),
            display_name: "Han".to_string(),
            contact: "010-9999-0000".to_string(),
            membership_kind: kind.to_string(),
            remaining_sessions: remaining,
            period_start: NaiveDate::from_ymd_opt(2026, 10, 1),
            period_end: NaiveDate::from_ymd_opt(2027, 1, 1),
            created_at: Utc::now(),
        }
    }

    async fn stored_balance(store: &MemoryStore) -> Option<i64> {
        store
            .find_member(ADDRESS)
            .await
            .unwrap()
            .unwrap()
            .remaining_sessions
    }

    #[tokio::test]
    async fn test_period_member_first_check_in_creates_one_record() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();

        let outcome = service.check_in(ADDRESS).await.unwrap();

        assert_eq!(outcome.to_string(), "Checked In (period-based)");
        let window = CheckInWindow::for_day(morning().date());
        let records = store.member_attendance(ADDRESS, &window).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].check_in_time, morning());
    }

    #[tokio::test]
    async fn test_period_member_second_check_in_same_day_is_rejected() {
        let (service, store, clock) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();

        service.check_in(ADDRESS).await.unwrap();
        clock.advance(Duration::hours(10));
        let second = service.check_in(ADDRESS).await;

        match second {
            Err(GymError::AlreadyCheckedInToday { identifier, date }) => {
                assert_eq!(identifier, ADDRESS);
                assert_eq!(date, morning().date());
            }
            other => panic!("Expected AlreadyCheckedInToday, got {:?}", other),
        }
        assert_eq!(store.attendance_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_period_member_can_check_in_again_next_day() {
        let (service, store, clock) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();

        service.check_in(ADDRESS).await.unwrap();
        clock.advance(Duration::days(1));

        assert!(service.check_in(ADDRESS).await.is_ok());
        assert_eq!(store.attendance_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_in_final_sub_second_still_blocks_check_in() {
        // The window query stops at 23:59:59.000, so it misses this record;
        // the per-day uniqueness of the insert still rejects the check-in.
        let (service, store, clock) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();
        let day = morning().date();
        store
            .insert_attendance(&AttendanceRecord::new(
                ADDRESS,
                day.and_hms_milli_opt(23, 59, 59, 200).unwrap(),
            ))
            .await
            .unwrap();
        clock.set(
            day.and_hms_milli_opt(23, 59, 59, 700)
                .unwrap()
                .and_utc()
                .fixed_offset(),
        );

        let result = service.check_in(ADDRESS).await;

        assert!(matches!(result, Err(GymError::AlreadyCheckedInToday { .. })));
        assert_eq!(store.attendance_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_session_member_with_one_session_goes_to_zero() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "session", Some(1))).await.unwrap();

        let outcome = service.check_in(ADDRESS).await.unwrap();

        match &outcome {
            CheckInOutcome::SessionBased {
                remaining_sessions, ..
            } => assert_eq!(*remaining_sessions, 0),
            other => panic!("Expected SessionBased outcome, got {:?}", other),
        }
        assert_eq!(outcome.to_string(), "Checked In (session-based, 0 remaining)");
        assert_eq!(stored_balance(&store).await, Some(0));
    }

    #[tokio::test]
    async fn test_session_member_with_zero_sessions_is_rejected() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "session", Some(0))).await.unwrap();

        let result = service.check_in(ADDRESS).await;

        assert!(matches!(result, Err(GymError::NoSessionsRemaining { .. })));
        assert_eq!(stored_balance(&store).await, Some(0));
    }

    #[tokio::test]
    async fn test_session_member_without_balance_is_rejected() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "session", None)).await.unwrap();

        let result = service.check_in(ADDRESS).await;

        assert!(matches!(result, Err(GymError::NoSessionsRemaining { .. })));
        assert_eq!(stored_balance(&store).await, None);
    }

    #[tokio::test]
    async fn test_session_member_may_check_in_several_times_a_day() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "session", Some(3))).await.unwrap();

        service.check_in(ADDRESS).await.unwrap();
        let outcome = service.check_in(ADDRESS).await.unwrap();

        assert_eq!(outcome.to_string(), "Checked In (session-based, 1 remaining)");
        assert_eq!(store.attendance_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_identifier_is_rejected_without_mutation() {
        let (service, store, _) = create_test_service();

        let result = service.check_in(ADDRESS).await;

        match result {
            Err(GymError::UnregisteredMember { identifier }) => assert_eq!(identifier, ADDRESS),
            other => panic!("Expected UnregisteredMember, got {:?}", other),
        }
        assert_eq!(store.attendance_count().unwrap(), 0);
        assert!(store.list_members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_membership_kind_is_reported() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "vip", Some(3))).await.unwrap();

        let result = service.check_in(ADDRESS).await;

        assert!(matches!(result, Err(GymError::UnknownMembershipKind { .. })));
        assert_eq!(store.attendance_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_scanned_ethereum_uri_checks_member_in() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "session", Some(10))).await.unwrap();

        let outcome = service
            .check_in_scanned(&format!("ethereum:{}", ADDRESS))
            .await
            .unwrap();

        assert_eq!(outcome.identifier(), ADDRESS);
        assert_eq!(outcome.display_name(), "Han");
    }

    #[tokio::test]
    async fn test_scanned_text_without_identifier_is_rejected() {
        let (service, _, _) = create_test_service();

        let result = service.check_in_scanned("https://example.com/not-a-member").await;

        assert!(matches!(result, Err(GymError::NoIdentifierFound)));
    }

    #[tokio::test]
    async fn test_concurrent_period_check_ins_record_once() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "period", None)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.check_in(ADDRESS).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(GymError::AlreadyCheckedInToday { .. }) => {}
                Err(other) => panic!("Unexpected error {:?}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.attendance_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_session_check_ins_never_overdraw() {
        let (service, store, _) = create_test_service();
        store.insert_member(&member_row(ADDRESS, "session", Some(3))).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.check_in(ADDRESS).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(stored_balance(&store).await, Some(0));
    }
}
