//! Core data models for the gym check-in service.
//!
//! This module contains the domain models used throughout the service.

mod attendance;
mod member;

pub use attendance::{AttendanceRecord, CheckInWindow};
pub use member::{Member, Membership, MembershipKind, MembershipStatus};
