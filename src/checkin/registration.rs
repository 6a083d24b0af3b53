//! Member registration.

use chrono::Months;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{GymError, GymResult};
use crate::identifier::is_canonical_identifier;
use crate::models::{Member, Membership};
use crate::store::{InsertOutcome, MemberRow};

use super::CheckInService;

/// The plan a new member buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipPlan {
    /// A counted number of sessions.
    Session {
        /// Sessions bought.
        sessions: u32,
    },
    /// Unlimited visits for a number of calendar months from today.
    Period {
        /// Plan length in months.
        months: u32,
    },
}

/// A request to register a new member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Canonical identifier from the member's wallet.
    pub identifier: String,
    /// Name shown on the dashboard.
    pub display_name: String,
    /// Phone number or other contact.
    pub contact: String,
    /// The plan bought.
    pub plan: MembershipPlan,
}

impl CheckInService {
    /// Registers a new member.
    ///
    /// Period plans start today (local) and end the same day `months`
    /// later, clamped to the end of shorter months.
    ///
    /// # Errors
    ///
    /// - `InvalidRegistration` for a malformed identifier, a blank name or
    ///   contact, or a plan that is not offered
    /// - `MemberAlreadyRegistered` if the identifier is taken
    /// - `Store` if the store fails
    pub async fn register(&self, request: RegistrationRequest) -> GymResult<Member> {
        let member = self.build_member(request)?;

        match self.store().insert_member(&MemberRow::from(&member)).await? {
            InsertOutcome::Inserted => {
                info!(
                    identifier = %member.identifier,
                    kind = %member.kind(),
                    "Member registered"
                );
                Ok(member)
            }
            InsertOutcome::Duplicate => {
                warn!(identifier = %member.identifier, "Identifier already registered");
                Err(GymError::MemberAlreadyRegistered {
                    identifier: member.identifier,
                })
            }
        }
    }

    fn build_member(&self, request: RegistrationRequest) -> GymResult<Member> {
        let identifier = request.identifier.trim();
        if !is_canonical_identifier(identifier) {
            return Err(GymError::invalid_registration(
                "identifier",
                "must be 0x followed by 40 hex digits",
            ));
        }

        let display_name = request.display_name.trim();
        if display_name.is_empty() {
            return Err(GymError::invalid_registration("display_name", "must not be blank"));
        }

        let contact = request.contact.trim();
        if contact.is_empty() {
            return Err(GymError::invalid_registration("contact", "must not be blank"));
        }

        let membership = match request.plan {
            MembershipPlan::Session { sessions } => {
                if !self.config().is_session_plan(sessions) {
                    return Err(GymError::invalid_registration(
                        "plan",
                        format!("no session plan with {} sessions", sessions),
                    ));
                }
                Membership::SessionBased {
                    remaining_sessions: sessions,
                }
            }
            MembershipPlan::Period { months } => {
                if !self.config().is_period_plan(months) {
                    return Err(GymError::invalid_registration(
                        "plan",
                        format!("no period plan of {} months", months),
                    ));
                }
                let start = self.clock().today();
                let end = start
                    .checked_add_months(Months::new(months))
                    .ok_or_else(|| {
                        GymError::invalid_registration("plan", "period end is out of range")
                    })?;
                Membership::PeriodBased {
                    period_start: Some(start),
                    period_end: Some(end),
                }
            }
        };

        Ok(Member {
            id: Uuid::new_v4(),
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            contact: contact.to_string(),
            membership,
            created_at: self.clock().utc_now(),
        })
    }
}
