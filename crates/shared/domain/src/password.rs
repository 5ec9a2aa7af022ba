//! Password value object - one-way hashing and verification of credentials.
//!
//! All hashing goes through a single Argon2 configuration with a fresh
//! random salt per digest.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::{DomainError, DomainResult};

/// Digest verified against when the account does not exist, so a login
/// for an unknown email costs the same as one with a wrong password.
static DUMMY_DIGEST: Lazy<Option<Password>> =
    Lazy::new(|| Password::new("timing-equaliser-not-a-real-password").ok());

/// Hashed password. Only the digest is ever held; the plain text is dropped
/// as soon as it has been hashed.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns a validation error if the password is too short, or a
    /// password error if the hashing primitive fails.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::validation(
                "password",
                format!(
                    "Password must be at least {} characters long",
                    MIN_PASSWORD_LENGTH
                ),
            ));
        }

        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Wrap an existing digest loaded from storage.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Get the digest for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the digest.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this digest.
    ///
    /// A malformed digest never verifies.
    pub fn verify(&self, plain_text: &str) -> bool {
        PasswordHash::new(&self.hash)
            .map(|parsed| {
                Self::argon2()
                    .verify_password(plain_text.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Run one verification against a throwaway digest and report failure.
    pub fn verify_dummy(plain_text: &str) -> bool {
        if let Some(dummy) = DUMMY_DIGEST.as_ref() {
            dummy.verify(plain_text);
        }
        false
    }

    fn hash(plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::password(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}
