//! User API Library
//!
//! HTTP surface of the user service: routing, request validation, bearer
//! authentication and the OpenAPI document.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::sync::Arc;

use tracing::info;

use auth_service_lib::{Authenticator, TokenIssuer};
use common::DatabaseConfig;
use user_service_lib::infra::Database;
use user_service_lib::repository::{UserRepository, UserStore};
use user_service_lib::service::UserManager;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

pub use user_service_lib::MigrateAction;

/// Connect to the database, apply migrations and serve HTTP until shutdown.
pub async fn run_server(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;

    let repo: Arc<dyn UserRepository> = Arc::new(UserStore::new(db.get_connection()));
    let tokens = TokenIssuer::new(&config.jwt);

    let state = AppState::new(
        Arc::new(Authenticator::new(repo.clone(), tokens)),
        Arc::new(UserManager::new(repo)),
    );

    let app = create_router(state);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("User API listening on {}", addr);
    info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Run a migration command against the configured database.
pub async fn run_migrations(
    config: &DatabaseConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    user_service_lib::run_migrations(config, action).await
}
