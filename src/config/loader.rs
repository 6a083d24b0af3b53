//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the service
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{GymError, GymResult};

use super::types::GymConfig;

/// Loads and provides access to the service configuration.
///
/// # Example
///
/// ```no_run
/// use gym_checkin::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/gym.yaml").unwrap();
/// println!("Listening on {}", loader.config().server.listen_addr);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: GymConfig,
}

impl ConfigLoader {
    /// Loads configuration from the YAML file at `path`.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - the file is missing or unreadable (`ConfigNotFound`)
    /// - the file contains invalid YAML (`ConfigParseError`)
    /// - a membership plan list is empty or contains zero (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> GymResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| GymError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config = Self::parse(&content).map_err(|message| GymError::ConfigParseError {
            path: path_str,
            message,
        })?;

        Ok(Self { config })
    }

    /// Wraps an already built configuration.
    pub fn from_config(config: GymConfig) -> Self {
        Self { config }
    }

    fn parse(content: &str) -> Result<GymConfig, String> {
        let config: GymConfig = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

        let plans = &config.memberships;
        if plans.session_plans.is_empty() || plans.session_plans.contains(&0) {
            return Err("memberships.session_plans must list positive session counts".to_string());
        }
        if plans.period_plans_months.is_empty() || plans.period_plans_months.contains(&0) {
            return Err("memberships.period_plans_months must list positive month counts".to_string());
        }

        Ok(config)
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &GymConfig {
        &self.config
    }

    /// Overrides the database URL.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database.url = url.into();
        self
    }

    /// Overrides the listen address.
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server.listen_addr = addr.into();
        self
    }

    /// Returns true if `count` is an offered session plan.
    pub fn is_session_plan(&self, count: u32) -> bool {
        self.config.memberships.session_plans.contains(&count)
    }

    /// Returns true if `months` is an offered period plan.
    pub fn is_period_plan(&self, months: u32) -> bool {
        self.config.memberships.period_plans_months.contains(&months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path() -> &'static str {
        "./config/gym.yaml"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().server.listen_addr, "127.0.0.1:8080");
        assert_eq!(loader.config().database.max_connections, 5);
        assert_eq!(loader.config().admin.low_session_limit, 5);
    }

    #[test]
    fn test_offered_plans() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        assert!(loader.is_session_plan(20));
        assert!(!loader.is_session_plan(15));
        assert!(loader.is_period_plan(6));
        assert!(!loader.is_period_plan(12));
    }

    #[test]
    fn test_load_missing_file_returns_error() {
        match ConfigLoader::load("/nonexistent/gym.yaml") {
            Err(GymError::ConfigNotFound { path }) => assert!(path.contains("gym.yaml")),
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_invalid_yaml_returns_parse_error() {
        match ConfigLoader::load("./config/invalid/gym.yaml") {
            Err(GymError::ConfigParseError { path, .. }) => assert!(path.contains("invalid")),
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = ConfigLoader::parse("admin:\n  low_session_limit: 3\n").unwrap();
        assert_eq!(config.admin.low_session_limit, 3);
        assert_eq!(config.admin.new_member_days, 7);
        assert_eq!(config.memberships.session_plans, vec![10, 20, 30]);
    }

    #[test]
    fn test_empty_plan_list_is_rejected() {
        let result = ConfigLoader::parse("memberships:\n  session_plans: []\n");
        assert!(result.unwrap_err().contains("session_plans"));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let loader = ConfigLoader::default()
            .with_database_url("sqlite::memory:")
            .with_listen_addr("0.0.0.0:9000");

        assert_eq!(loader.config().database.url, "sqlite::memory:");
        assert_eq!(loader.config().server.listen_addr, "0.0.0.0:9000");
    }
}
