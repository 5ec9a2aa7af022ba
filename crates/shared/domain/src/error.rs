//! Domain-level errors.
//!
//! These errors represent business rule violations and domain logic failures.
//! They are independent of infrastructure concerns (HTTP, database).

use thiserror::Error;

use crate::validation::FieldViolation;

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// One or more input fields failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    /// Stored status code is neither active nor inactive
    #[error("Invalid status code: {0}")]
    InvalidStatus(i16),

    /// Hashing primitive failed
    #[error("Password error: {0}")]
    Password(String),
}

impl DomainError {
    /// Create a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldViolation::new(field, message)])
    }

    /// Create a password error
    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
