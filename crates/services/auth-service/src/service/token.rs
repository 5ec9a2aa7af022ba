//! Bearer token signing and verification (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use common::{AppError, AppResult, JwtConfig};
use domain::User;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration_hours: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiration_hours", &self.expiration_hours)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiration_hours: config.expiration_hours,
        }
    }

    /// Sign a token bound to the user's id and email.
    pub fn sign(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.expiration_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AppError::internal("Token expiry out of range"))?;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("Token signing failed: {}", e)))
    }

    /// Check signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }
}
