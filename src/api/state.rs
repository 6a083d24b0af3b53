//! Application state for the check-in API.
//!
//! The state is shared by every request handler and cloned per request.

use std::sync::Arc;

use crate::admin::AdminService;
use crate::checkin::CheckInService;
use crate::clock::Clock;
use crate::config::ConfigLoader;
use crate::store::MemberStore;

/// Shared application state.
///
/// Both services read and write the same injected store.
#[derive(Clone)]
pub struct AppState {
    checkin: CheckInService,
    admin: AdminService,
}

impl AppState {
    /// Creates the state over a store, a clock and the loaded configuration.
    pub fn new(store: Arc<dyn MemberStore>, clock: Arc<dyn Clock>, config: ConfigLoader) -> Self {
        let admin = AdminService::new(store.clone(), clock.clone(), config.config().admin.clone());
        Self {
            checkin: CheckInService::new(store, clock, config),
            admin,
        }
    }

    /// Returns the check-in service.
    pub fn checkin(&self) -> &CheckInService {
        &self.checkin
    }

    /// Returns the admin report service.
    pub fn admin(&self) -> &AdminService {
        &self.admin
    }
}
