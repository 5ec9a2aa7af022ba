//! Route configuration.

use axum::{
    http::{header::ALLOW, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::AppError;

use crate::handlers::{auth_routes, health_routes, me_routes, user_routes};
use crate::middleware::auth_middleware;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth)
        .nest("/health", health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Auth routes; only /auth/me needs a token
        .nest(
            "/auth",
            auth_routes().merge(me_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))),
        )
        .nest("/users", user_routes())
        .fallback(not_found)
        .layer(middleware::map_response(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for paths no route matches.
async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// The router answers a known path with an unsupported method with a bare
/// 405; give it the error envelope.
async fn method_not_allowed(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        let mut enveloped = AppError::MethodNotAllowed.into_response();
        if let Some(allow) = response.headers().get(ALLOW) {
            enveloped.headers_mut().insert(ALLOW, allow.clone());
        }
        return enveloped;
    }
    response
}
