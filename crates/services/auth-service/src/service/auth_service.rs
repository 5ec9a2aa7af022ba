//! Authentication service - Handles registration and login.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use common::{AppError, AppResult};
use domain::{
    CreateUser, NewUser, Password, UserStatus, UserSummary, EMAIL_EXISTS_MESSAGE,
    INACTIVE_ACCOUNT_MESSAGE, INVALID_CREDENTIALS_MESSAGE,
};
use user_service_lib::repository::UserRepository;

use super::token::{Claims, TokenIssuer};

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub user: UserSummary,
    pub token: String,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new active user and issue a token for it
    async fn register(&self, input: CreateUser) -> AppResult<AuthPayload>;

    /// Check credentials and issue a token
    async fn login(&self, email: &str, password: &str) -> AppResult<AuthPayload>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Concrete implementation of AuthService over the user store.
pub struct Authenticator {
    repo: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(repo: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { repo, tokens }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, input: CreateUser) -> AppResult<AuthPayload> {
        if self.repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::conflict(EMAIL_EXISTS_MESSAGE));
        }

        let password = Password::new(&input.password)?;
        let user = self
            .repo
            .create(NewUser {
                email: input.email,
                password_hash: password.into_string(),
                first_name: input.first_name,
                last_name: input.last_name,
                phone: input.phone,
                status: UserStatus::Active,
            })
            .await?;

        let token = self.tokens.sign(&user)?;
        info!(user_id = user.id, "User registered");

        Ok(AuthPayload {
            user: user.summary(),
            token,
        })
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<AuthPayload> {
        let found = self.repo.find_by_email(email).await?;

        // Exactly one digest verification on every path
        let verified = match &found {
            Some(user) => user.password.verify(password),
            None => Password::verify_dummy(password),
        };

        let user = match found {
            Some(user) if verified => user,
            _ => {
                warn!("Login rejected: invalid credentials");
                return Err(AppError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
            }
        };

        if !user.is_active() {
            warn!(user_id = user.id, "Login rejected: account inactive");
            return Err(AppError::unauthorized(INACTIVE_ACCOUNT_MESSAGE));
        }

        let token = self.tokens.sign(&user)?;
        info!(user_id = user.id, "User logged in");

        Ok(AuthPayload {
            user: user.summary(),
            token,
        })
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.tokens.verify(token)
    }
}
