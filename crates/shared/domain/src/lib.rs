//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.

pub mod constants;
pub mod error;
pub mod password;
pub mod user;
pub mod validation;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use user::{
    boolean_to_status, status_to_boolean, CreateUser, Lifecycle, NewUser, PublicUser, Role,
    UpdateUser, User, UserChanges, UserStatus, UserSummary,
};
pub use validation::{FieldViolation, Validate, Violations};
