//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Roles
// =============================================================================

/// Role seeded for ordinary accounts
pub const ROLE_USER: &str = "user";

/// Role seeded for administrators
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Account status codes (persisted form of `active`)
// =============================================================================

/// Stored code for an active account
pub const STATUS_ACTIVE: i16 = 1;

/// Stored code for a deactivated account
pub const STATUS_INACTIVE: i16 = 0;

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of first and last names
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a phone number
pub const MAX_PHONE_LENGTH: usize = 20;

// =============================================================================
// Pagination
// =============================================================================

/// Default page number (1-indexed)
pub const DEFAULT_PAGE: i64 = 1;

/// Default number of items per page
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Maximum allowed items per page
pub const MAX_PAGE_LIMIT: i64 = 100;

// =============================================================================
// Authentication
// =============================================================================

/// Default JWT token expiration in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// Message for a create or update that collides with a live account
pub const EMAIL_EXISTS_MESSAGE: &str = "Email already exists";

/// Message for both unknown email and wrong password
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Message for a correct login against a deactivated account
pub const INACTIVE_ACCOUNT_MESSAGE: &str = "Account is not active";
