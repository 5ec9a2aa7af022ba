//! Auth Service Library
//!
//! Registration, login and bearer token handling on top of the user store.

pub mod service;

pub use service::{AuthPayload, AuthService, Authenticator, Claims, TokenIssuer};
