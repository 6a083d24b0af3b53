//! Configuration types for the gym check-in service.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every section has
//! defaults, so a partial file is valid.

use serde::Deserialize;

/// The complete service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GymConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Record store settings.
    pub database: DatabaseConfig,
    /// Plans offered at registration.
    pub memberships: MembershipPlans,
    /// Dashboard report thresholds.
    pub admin: AdminThresholds,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://gym.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// Plans a member can register for.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MembershipPlans {
    /// Session counts sold as session-based plans.
    pub session_plans: Vec<u32>,
    /// Lengths in calendar months of period-based plans.
    pub period_plans_months: Vec<u32>,
}

impl Default for MembershipPlans {
    fn default() -> Self {
        Self {
            session_plans: vec![10, 20, 30],
            period_plans_months: vec![1, 3, 6],
        }
    }
}

/// Default look-back and look-ahead ranges of the dashboard reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminThresholds {
    /// Members registered within this many days count as new.
    pub new_member_days: i64,
    /// Period memberships ending within this many days count as expiring.
    pub expiring_within_days: i64,
    /// Session balances at or below this count as low.
    pub low_session_limit: u32,
}

impl Default for AdminThresholds {
    fn default() -> Self {
        Self {
            new_member_days: 7,
            expiring_within_days: 7,
            low_session_limit: 5,
        }
    }
}
