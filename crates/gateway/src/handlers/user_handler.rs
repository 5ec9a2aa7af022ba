//! User handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};

use common::{AppError, AppResult, Created, Envelope, NoContent};
use domain::{
    CreateUser, FieldViolation, PublicUser, UpdateUser, Validate, Violations, DEFAULT_PAGE,
    DEFAULT_PAGE_LIMIT, MAX_NAME_LENGTH, MAX_PHONE_LENGTH, MIN_PASSWORD_LENGTH,
};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Absent stays `None`, explicit `null` becomes `Some(None)`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Administrative user creation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: Option<String>,
    #[serde(default)]
    #[schema(example = "Jane", max_length = 100)]
    pub first_name: Option<String>,
    #[serde(default)]
    #[schema(example = "Doe", max_length = 100)]
    pub last_name: Option<String>,
    #[serde(default)]
    #[schema(example = "+1 (555) 123-4567", max_length = 20)]
    pub phone: Option<String>,
}

impl Validate for CreateUserRequest {
    fn violations(&self) -> Vec<FieldViolation> {
        Violations::new()
            .required_email("email", self.email.as_deref())
            .required_password("password", self.password.as_deref(), MIN_PASSWORD_LENGTH)
            .max_chars("firstName", "First name", self.first_name.as_deref(), MAX_NAME_LENGTH)
            .max_chars("lastName", "Last name", self.last_name.as_deref(), MAX_NAME_LENGTH)
            .phone("phone", self.phone.as_deref(), MAX_PHONE_LENGTH)
            .finish()
    }
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        CreateUser {
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
        }
    }
}

/// Partial update. Omitted fields are left untouched; `null` clears the
/// optional profile fields.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[schema(example = "new@example.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(min_length = 8)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, max_length = 100)]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, max_length = 100)]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, max_length = 20)]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Validate for UpdateUserRequest {
    fn violations(&self) -> Vec<FieldViolation> {
        Violations::new()
            .email("email", self.email.as_deref())
            .password("password", self.password.as_deref(), MIN_PASSWORD_LENGTH)
            .max_chars(
                "firstName",
                "First name",
                self.first_name.as_ref().and_then(Option::as_deref),
                MAX_NAME_LENGTH,
            )
            .max_chars(
                "lastName",
                "Last name",
                self.last_name.as_ref().and_then(Option::as_deref),
                MAX_NAME_LENGTH,
            )
            .phone(
                "phone",
                self.phone.as_ref().and_then(Option::as_deref),
                MAX_PHONE_LENGTH,
            )
            .finish()
    }
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        UpdateUser {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            is_active: req.is_active,
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Page number, 1-based (default 1)
    pub page: Option<i64>,
    /// Items per page, 1 to 100 (default 20)
    pub limit: Option<i64>,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = crate::openapi::UserEnvelope),
        (status = 400, description = "Validation error", body = crate::openapi::ErrorEnvelope),
        (status = 409, description = "Email already exists", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<Created<PublicUser>> {
    let user = state.user_service.create(payload.into()).await?;
    Ok(Created(user.public_view()))
}

/// List users, newest first
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users", body = crate::openapi::UserListEnvelope),
        (status = 400, description = "Page or limit out of range", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListUsersQuery>, AppError>,
) -> AppResult<Envelope<Vec<PublicUser>>> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let users = state.user_service.list(page, limit).await?;
    Ok(Envelope::paged(users.map(|u| u.public_view())))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = crate::openapi::UserEnvelope),
        (status = 400, description = "Malformed ID", body = crate::openapi::ErrorEnvelope),
        (status = 404, description = "User not found", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Envelope<PublicUser>> {
    let user = state.user_service.get_by_id(id).await?;
    Ok(Envelope::new(user.public_view()))
}

/// Update user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = crate::openapi::UserEnvelope),
        (status = 400, description = "Validation error", body = crate::openapi::ErrorEnvelope),
        (status = 404, description = "User not found", body = crate::openapi::ErrorEnvelope),
        (status = 409, description = "Email already exists", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Envelope<PublicUser>> {
    let user = state.user_service.update(id, payload.into()).await?;
    Ok(Envelope::new(user.public_view()))
}

/// Soft delete user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::openapi::ErrorEnvelope)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<NoContent> {
    state.user_service.remove(id).await?;
    Ok(NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_absent_and_null() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"firstName":"X","lastName":null}"#).unwrap();

        assert_eq!(req.first_name, Some(Some("X".to_string())));
        assert_eq!(req.last_name, Some(None));
        assert_eq!(req.phone, None);
        assert_eq!(req.email, None);
    }

    #[test]
    fn test_update_null_email_is_absent() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"email":null}"#).unwrap();

        assert_eq!(req.email, None);
        assert!(req.violations().is_empty());
    }

    #[test]
    fn test_update_validates_present_fields_only() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"email":"nope","phone":"abc"}"#).unwrap();

        let fields: Vec<_> = req.violations().into_iter().map(|v| v.field).collect();

        assert_eq!(fields, vec!["email", "phone"]);
    }

    #[test]
    fn test_create_phone_rules() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"SecurePass123","phone":"555-CALL-NOW"}"#,
        )
        .unwrap();

        let violations = req.violations();

        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Phone must contain only valid phone characters"
        );
    }
}
