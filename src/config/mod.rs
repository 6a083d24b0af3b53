//! Configuration loading and management for the gym check-in service.
//!
//! # Example
//!
//! ```no_run
//! use gym_checkin::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/gym.yaml").unwrap();
//! println!("Database: {}", config.config().database.url);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AdminThresholds, DatabaseConfig, GymConfig, MembershipPlans, ServerConfig};
