//! OpenAPI documentation.

use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::handlers::auth_handler::{AuthResponse, LoginRequest, RegisterRequest};
use crate::handlers::health_handler::HealthResponse;
use crate::handlers::user_handler::{CreateUserRequest, UpdateUserRequest};
use domain::{FieldViolation, PublicUser, Role, UserSummary};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::auth_handler::register,
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::me,
        crate::handlers::user_handler::create_user,
        crate::handlers::user_handler::list_users,
        crate::handlers::user_handler::get_user,
        crate::handlers::user_handler::update_user,
        crate::handlers::user_handler::delete_user,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            CreateUserRequest,
            UpdateUserRequest,
            PublicUser,
            UserSummary,
            Role,
            FieldViolation,
            ResponseMeta,
            PageResponseMeta,
            UserEnvelope,
            UserListEnvelope,
            AuthEnvelope,
            ErrorEnvelope,
            ErrorBody,
            ErrorDetails,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Authentication", description = "Registration, login and token checks"),
        (name = "Users", description = "User management endpoints"),
    )
)]
pub struct ApiDoc;

// Schemas below describe the wire envelopes for the document only.

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Epoch milliseconds
    #[schema(example = "1700000000000")]
    pub timestamp: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageResponseMeta {
    #[schema(example = "1700000000000")]
    pub timestamp: String,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, ToSchema)]
pub struct UserEnvelope {
    pub data: PublicUser,
    pub meta: ResponseMeta,
}

#[derive(Serialize, ToSchema)]
pub struct UserListEnvelope {
    pub data: Vec<PublicUser>,
    pub meta: PageResponseMeta,
}

#[derive(Serialize, ToSchema)]
pub struct AuthEnvelope {
    pub data: AuthResponse,
    pub meta: ResponseMeta,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    #[schema(example = "Validation failed")]
    pub message: String,
    pub details: ErrorDetails,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDetails {
    /// Present only for `VALIDATION_ERROR`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldViolation>>,
}

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
