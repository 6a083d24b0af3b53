//! Member model and related types.
//!
//! This module defines the [`Member`] struct and the [`Membership`] enum,
//! which carries only the fields meaningful for its kind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of membership a member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    /// A counted balance of visits ("PT" plans).
    Session,
    /// Unlimited daily visits within a date range ("free" plans).
    Period,
}

impl MembershipKind {
    /// Returns the storage name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipKind::Session => "session",
            MembershipKind::Period => "period",
        }
    }
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipKind {
    type Err = String;

    /// Parses a stored kind. The legacy names `pt` and `free` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" | "pt" => Ok(MembershipKind::Session),
            "period" | "free" => Ok(MembershipKind::Period),
            _ => Err(s.to_string()),
        }
    }
}

/// Kind-specific membership state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Membership {
    /// Session-based membership with its remaining balance.
    #[serde(rename = "session")]
    SessionBased {
        /// Sessions left; decremented by each check-in.
        remaining_sessions: u32,
    },
    /// Period-based membership valid between two dates.
    #[serde(rename = "period")]
    PeriodBased {
        /// First valid day.
        period_start: Option<NaiveDate>,
        /// Last valid day. `None` means the membership never expires.
        period_end: Option<NaiveDate>,
    },
}

impl Membership {
    /// Returns the kind of this membership.
    pub fn kind(&self) -> MembershipKind {
        match self {
            Membership::SessionBased { .. } => MembershipKind::Session,
            Membership::PeriodBased { .. } => MembershipKind::Period,
        }
    }
}

/// Represents one gym patron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Row id.
    pub id: Uuid,
    /// Canonical identifier (`0x` + 40 hex digits); the lookup key.
    pub identifier: String,
    /// Name shown on the dashboard.
    pub display_name: String,
    /// Phone number or other contact.
    pub contact: String,
    /// Kind-specific membership state.
    #[serde(flatten)]
    pub membership: Membership,
    /// When the member registered.
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Returns the membership kind.
    pub fn kind(&self) -> MembershipKind {
        self.membership.kind()
    }

    /// Returns the remaining sessions for session-based members.
    pub fn remaining_sessions(&self) -> Option<u32> {
        match self.membership {
            Membership::SessionBased { remaining_sessions } => Some(remaining_sessions),
            Membership::PeriodBased { .. } => None,
        }
    }

    /// Returns the membership status as of `today`.
    ///
    /// A period membership is still valid on its end date.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, Utc};
    /// use gym_checkin::models::{Member, Membership, MembershipStatus};
    /// use uuid::Uuid;
    ///
    /// let member = Member {
    ///     id: Uuid::new_v4(),
    ///     identifier: "0x52908400098527886E0F7030069857D2E4169EE7".to_string(),
    ///     display_name: "Kim".to_string(),
    ///     contact: "010-1234-5678".to_string(),
    ///     membership: Membership::PeriodBased {
    ///         period_start: NaiveDate::from_ymd_opt(2026, 10, 1),
    ///         period_end: NaiveDate::from_ymd_opt(2026, 10, 20),
    ///     },
    ///     created_at: Utc::now(),
    /// };
    /// let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    /// assert_eq!(member.status(today), MembershipStatus::DaysLeft { days: 3 });
    /// ```
    pub fn status(&self, today: NaiveDate) -> MembershipStatus {
        match self.membership {
            Membership::SessionBased { remaining_sessions } => MembershipStatus::SessionsLeft {
                remaining: remaining_sessions,
            },
            Membership::PeriodBased {
                period_end: Some(end),
                ..
            } => {
                let days = (end - today).num_days();
                if days < 0 {
                    MembershipStatus::Expired
                } else {
                    MembershipStatus::DaysLeft { days }
                }
            }
            Membership::PeriodBased {
                period_end: None, ..
            } => MembershipStatus::Unlimited,
        }
    }
}

/// Dashboard status of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Session-based member with this many sessions left.
    SessionsLeft {
        /// Sessions left.
        remaining: u32,
    },
    /// Period-based member with this many days until the end date.
    DaysLeft {
        /// Days until the end date; 0 on the end date itself.
        days: i64,
    },
    /// Period-based member past the end date.
    Expired,
    /// Period-based member without an end date.
    Unlimited,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_member(membership: Membership) -> Member {
        Member {
            id: Uuid::new_v4(),
            identifier: "0x52908400098527886E0F7030069857D2E4169EE7".to_string(),
            display_name: "Kim Minji".to_string(),
            contact: "010-1234-5678".to_string(),
            membership,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_membership_kind_parses_storage_and_legacy_names() {
        assert_eq!("session".parse::<MembershipKind>(), Ok(MembershipKind::Session));
        assert_eq!("pt".parse::<MembershipKind>(), Ok(MembershipKind::Session));
        assert_eq!("period".parse::<MembershipKind>(), Ok(MembershipKind::Period));
        assert_eq!("FREE".parse::<MembershipKind>(), Ok(MembershipKind::Period));
        assert_eq!("vip".parse::<MembershipKind>(), Err("vip".to_string()));
    }

    #[test]
    fn test_session_member_serializes_flat() {
        let member = create_test_member(Membership::SessionBased {
            remaining_sessions: 10,
        });
        let json = serde_json::to_value(&member).unwrap();

        assert_eq!(json["kind"], "session");
        assert_eq!(json["remaining_sessions"], 10);
        assert!(json.get("period_end").is_none());
    }

    #[test]
    fn test_period_member_deserializes() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "identifier": "0x52908400098527886E0F7030069857D2E4169EE7",
            "display_name": "Lee",
            "contact": "010-0000-0000",
            "kind": "period",
            "period_start": "2026-10-01",
            "period_end": "2027-01-01",
            "created_at": "2026-10-01T09:00:00Z"
        }"#;

        let member: Member = serde_json::from_str(json).unwrap();
        assert_eq!(member.kind(), MembershipKind::Period);
        assert_eq!(member.remaining_sessions(), None);
        assert_eq!(
            member.membership,
            Membership::PeriodBased {
                period_start: Some(date(2026, 10, 1)),
                period_end: Some(date(2027, 1, 1)),
            }
        );
    }

    #[test]
    fn test_status_for_session_member() {
        let member = create_test_member(Membership::SessionBased {
            remaining_sessions: 3,
        });
        assert_eq!(
            member.status(date(2026, 10, 17)),
            MembershipStatus::SessionsLeft { remaining: 3 }
        );
    }

    #[test]
    fn test_status_on_end_date_is_zero_days_left() {
        let member = create_test_member(Membership::PeriodBased {
            period_start: Some(date(2026, 9, 17)),
            period_end: Some(date(2026, 10, 17)),
        });
        assert_eq!(
            member.status(date(2026, 10, 17)),
            MembershipStatus::DaysLeft { days: 0 }
        );
        assert_eq!(member.status(date(2026, 10, 18)), MembershipStatus::Expired);
    }

    #[test]
    fn test_status_without_end_date_is_unlimited() {
        let member = create_test_member(Membership::PeriodBased {
            period_start: None,
            period_end: None,
        });
        assert_eq!(
            member.status(date(2026, 10, 17)),
            MembershipStatus::Unlimited
        );
    }
}
