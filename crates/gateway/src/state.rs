//! Application state for dependency injection.

use std::sync::Arc;

use auth_service_lib::AuthService;
use user_service_lib::service::UserService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
}

impl AppState {
    /// Create new app state.
    pub fn new(auth_service: Arc<dyn AuthService>, user_service: Arc<dyn UserService>) -> Self {
        Self {
            auth_service,
            user_service,
        }
    }
}
