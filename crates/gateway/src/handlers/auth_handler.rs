//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use auth_service_lib::AuthPayload;
use common::{AppResult, Created, Envelope};
use domain::{
    CreateUser, FieldViolation, PublicUser, UserSummary, Validate, Violations, MAX_NAME_LENGTH,
    MIN_PASSWORD_LENGTH,
};

use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// User registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// User email address
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    /// User password (minimum 8 characters)
    #[serde(default)]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: Option<String>,
    #[serde(default)]
    #[schema(example = "Jane", max_length = 100)]
    pub first_name: Option<String>,
    #[serde(default)]
    #[schema(example = "Doe", max_length = 100)]
    pub last_name: Option<String>,
}

impl Validate for RegisterRequest {
    fn violations(&self) -> Vec<FieldViolation> {
        Violations::new()
            .required_email("email", self.email.as_deref())
            .required_password("password", self.password.as_deref(), MIN_PASSWORD_LENGTH)
            .max_chars("firstName", "First name", self.first_name.as_deref(), MAX_NAME_LENGTH)
            .max_chars("lastName", "Last name", self.last_name.as_deref(), MAX_NAME_LENGTH)
            .finish()
    }
}

impl From<RegisterRequest> for CreateUser {
    fn from(req: RegisterRequest) -> Self {
        CreateUser {
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            first_name: req.first_name,
            last_name: req.last_name,
            phone: None,
        }
    }
}

/// User login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    /// User password
    #[serde(default)]
    #[schema(example = "SecurePass123!")]
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn violations(&self) -> Vec<FieldViolation> {
        Violations::new()
            .required_email("email", self.email.as_deref())
            .required("password", "Password", self.password.as_deref())
            .finish()
    }
}

/// Issued token with the account it belongs to
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserSummary,
    /// Bearer token for the `Authorization` header
    pub token: String,
}

impl From<AuthPayload> for AuthResponse {
    fn from(payload: AuthPayload) -> Self {
        Self {
            user: payload.user,
            token: payload.token,
        }
    }
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes that need a verified bearer token
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = crate::openapi::AuthEnvelope),
        (status = 400, description = "Validation error", body = crate::openapi::ErrorEnvelope),
        (status = 409, description = "Email already exists", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<AuthResponse>> {
    let result = state.auth_service.register(payload.into()).await?;
    Ok(Created(result.into()))
}

/// Login and get a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::openapi::AuthEnvelope),
        (status = 400, description = "Validation error", body = crate::openapi::ErrorEnvelope),
        (status = 401, description = "Invalid credentials or inactive account", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Envelope<AuthResponse>> {
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let result = state.auth_service.login(&email, &password).await?;
    Ok(Envelope::new(result.into()))
}

/// Profile of the token holder
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = crate::openapi::UserEnvelope),
        (status = 401, description = "Missing or invalid token", body = crate::openapi::ErrorEnvelope),
        (status = 404, description = "Account no longer exists", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn me(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Envelope<PublicUser>> {
    let user = state.user_service.get_by_id(current_user.id).await?;
    Ok(Envelope::new(user.public_view()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_collects_every_violation() {
        let req: RegisterRequest = serde_json_from(r#"{"email":"bad","password":"short"}"#);

        let fields: Vec<_> = req.violations().into_iter().map(|v| v.field).collect();

        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn test_register_missing_fields() {
        let req: RegisterRequest = serde_json_from("{}");

        let messages: Vec<_> = req.violations().into_iter().map(|v| v.message).collect();

        assert_eq!(messages, vec!["Email is required", "Password is required"]);
    }

    #[test]
    fn test_register_name_too_long() {
        let body = format!(
            r#"{{"email":"a@b.co","password":"SecurePass123","firstName":"{}"}}"#,
            "x".repeat(101)
        );
        let req: RegisterRequest = serde_json_from(&body);

        let violations = req.violations();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "firstName");
        assert_eq!(violations[0].message, "First name must not exceed 100 characters");
    }

    #[test]
    fn test_login_requires_password() {
        let req: LoginRequest = serde_json_from(r#"{"email":"a@b.co","password":""}"#);

        let violations = req.violations();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "password");
    }

    fn serde_json_from<T: serde::de::DeserializeOwned>(body: &str) -> T {
        serde_json::from_str(body).unwrap()
    }
}
