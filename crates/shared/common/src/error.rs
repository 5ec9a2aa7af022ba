//! Unified error handling for the HTTP surface.
//!
//! Every failure leaves the service as the same envelope:
//! `{ "error": { "code", "message", "details" } }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, FieldViolation};
use serde::Serialize;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Input
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    BadRequest(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    // Authentication & Authorization
    #[error("{0}")]
    Unauthorized(String),

    #[error("Access denied")]
    Forbidden,

    // External errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[cfg(feature = "jwt")]
    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    details: ErrorDetails,
}

/// Serializes to `{}` unless field violations are attached.
#[derive(Debug, Default, Serialize)]
struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FieldViolation>>,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidArgument(_) | AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            #[cfg(feature = "database")]
            AppError::Database(_) => "INTERNAL_SERVER_ERROR",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidArgument(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            #[cfg(feature = "jwt")]
            AppError::Jwt(e) => {
                tracing::debug!("JWT rejected: {:?}", e);
                "Invalid or expired token".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    fn details(&self) -> ErrorDetails {
        match self {
            AppError::Validation(fields) => ErrorDetails {
                fields: Some(fields.clone()),
            },
            _ => ErrorDetails::default(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.user_message(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(fields) => AppError::Validation(fields),
            DomainError::InvalidStatus(code) => {
                AppError::Internal(format!("Invalid status code in storage: {}", code))
            }
            DomainError::Password(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![FieldViolation::new("body", rejection.body_text())])
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_envelope_lists_fields() {
        let err = AppError::Validation(vec![
            FieldViolation::new("email", "Email must be a valid email address"),
            FieldViolation::new("password", "Password is required"),
        ]);

        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Validation failed");
        assert_eq!(body["error"]["details"]["fields"][0]["field"], "email");
        assert_eq!(body["error"]["details"]["fields"][1]["field"], "password");
    }

    #[tokio::test]
    async fn test_other_errors_have_empty_details() {
        let (status, body) = body_of(AppError::not_found("User with ID 4 not found")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "User with ID 4 not found");
        assert_eq!(body["error"]["details"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_internal_message_is_hidden() {
        let (status, body) = body_of(AppError::internal("pool exhausted")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (AppError::invalid_argument("x"), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::conflict("x"), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::unauthorized("x"), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden, StatusCode::FORBIDDEN, "FORBIDDEN"),
            (
                AppError::MethodNotAllowed,
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_domain_validation_keeps_fields() {
        let err: AppError = DomainError::validation("password", "too short").into();
        match err {
            AppError::Validation(fields) => assert_eq!(fields[0].field, "password"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<i32> = None;
        let err = missing.ok_or_not_found("gone").unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "gone"));
    }
}
