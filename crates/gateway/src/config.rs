//! Gateway configuration.

use common::{ConfigError, DatabaseConfig, JwtConfig, ServiceConfig};

/// Everything the HTTP binary needs, loaded from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server: ServiceConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServiceConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
        })
    }
}
