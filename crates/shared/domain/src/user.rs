//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{STATUS_ACTIVE, STATUS_INACTIVE};
use crate::error::DomainError;
use crate::password::Password;

/// Account status, persisted as a 1/0 status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    /// Stored status code
    pub fn code(self) -> i16 {
        match self {
            UserStatus::Active => STATUS_ACTIVE,
            UserStatus::Inactive => STATUS_INACTIVE,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl From<bool> for UserStatus {
    fn from(active: bool) -> Self {
        if active {
            UserStatus::Active
        } else {
            UserStatus::Inactive
        }
    }
}

impl From<UserStatus> for bool {
    fn from(status: UserStatus) -> Self {
        status.is_active()
    }
}

impl TryFrom<i16> for UserStatus {
    type Error = DomainError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            STATUS_ACTIVE => Ok(UserStatus::Active),
            STATUS_INACTIVE => Ok(UserStatus::Inactive),
            other => Err(DomainError::InvalidStatus(other)),
        }
    }
}

/// Map an `active` flag to its stored status code.
pub fn boolean_to_status(active: bool) -> i16 {
    UserStatus::from(active).code()
}

/// Map a stored status code back to the `active` flag.
pub fn status_to_boolean(code: i16) -> Result<bool, DomainError> {
    UserStatus::try_from(code).map(bool::from)
}

/// Where a user record is in its lifecycle.
///
/// Deleted records stay in storage but are invisible to every normal read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    /// Build from the nullable `deleted_at` column.
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Deleted { at },
            None => Lifecycle::Active,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Lifecycle::Deleted { .. })
    }
}

/// Role a user can hold. Users and roles are linked many-to-many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// User domain entity. Never serialized directly; see [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: Password,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
    pub roles: Vec<Role>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// Outward representation: every field except the credential digest
    /// and the deletion marker.
    pub fn public_view(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            is_active: self.status.is_active(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            roles: self.roles.clone(),
        }
    }

    /// Short form returned alongside an issued token.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Input for creating a user. The password is still plain text here.
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Partial update. `None` leaves a field untouched; for the nullable
/// columns `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Row handed to the store on insert, after hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub status: UserStatus,
}

/// Row-level changes handed to the store, after hashing and status mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub status: Option<UserStatus>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

/// User fields returned by register and login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
