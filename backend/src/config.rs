//! Configuration management for the Inventory & Billing server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with IB_ prefix (`IB__DATABASE__URL`)

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origin, `*` for any
    pub allowed_origin: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IB_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("jwt.access_token_expiry", 86400)?
            .set_default("cors.allowed_origin", "*")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IB_ prefix)
            .add_source(
                Environment::with_prefix("IB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Migrations are applied on startup everywhere except production
    pub fn runs_migrations(&self) -> bool {
        self.environment != "production"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for tests that never touch a real database
    pub fn for_tests() -> Self {
        Self {
            environment: "test".into(),
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".into(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/inventory_billing_test".into(),
                max_connections: 1,
                min_connections: 0,
                acquire_timeout_secs: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                access_token_expiry: 3600,
            },
            cors: CorsConfig {
                allowed_origin: "*".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_skipped_in_production() {
        let mut config = Config::for_tests();
        assert!(config.runs_migrations());
        config.environment = "production".into();
        assert!(!config.runs_migrations());
    }

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_tests();
        config.server.port = 3001;
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
    }
}
