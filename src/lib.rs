//! Gym membership registration and QR check-in.
//!
//! This crate resolves a scanned member code to a registered member and
//! applies the check-in rule for that member's plan: period-based members
//! get one attendance record per local day, session-based members spend one
//! session per visit. It also provides registration, admin reports, a
//! scanner session model and an HTTP API over a SQLite record store.

#![warn(missing_docs)]

pub mod admin;
pub mod api;
pub mod checkin;
pub mod clock;
pub mod config;
pub mod error;
pub mod identifier;
pub mod models;
pub mod scanner;
pub mod store;
