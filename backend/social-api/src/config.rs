//! Configuration for the social API
//!
//! Loads settings from environment variables, with a `.env` file picked up
//! for local development.

use anyhow::{Context, Result};
use db_pool::env_utils::{parse_env_flag, parse_env_optional, parse_env_with_default};
use db_pool::DbConfig;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "social-api";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,

    /// `None` runs against the in-memory repository
    pub database: Option<DbConfig>,

    pub jwt: JwtConfig,

    pub graphql: GraphQLConfig,

    pub pagination: PaginationConfig,

    pub pubsub: PubSubConfig,

    /// Insert demo users, posts and messages on startup
    pub seed_database: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared HS256 secret
    pub secret: String,
    /// Token lifetime
    pub expiry_seconds: u64,
    /// Request header carrying the session token
    pub header_name: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry_seconds", &self.expiry_seconds)
            .field("header_name", &self.header_name)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiry_seconds: 30 * 60,
            header_name: "x-token".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Serve the GraphQL Playground page
    pub playground: bool,
    /// Allow introspection queries
    pub introspection: bool,
    pub max_depth: usize,
    pub max_complexity: usize,
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            playground: true,
            introspection: true,
            max_depth: 10,
            max_complexity: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the client passes no `limit`
    pub default_limit: i32,
    pub max_limit: i32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 2,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// Events buffered per subscriber before it starts lagging
    pub capacity: usize,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = match parse_env_optional::<String>("DATABASE_URL") {
            Some(url) if !url.trim().is_empty() => Some(DbConfig::from_env(SERVICE_NAME, url)),
            _ => {
                warn!("DATABASE_URL not set; using the in-memory repository");
                None
            }
        };

        let pagination = PaginationConfig {
            default_limit: parse_env_with_default("PAGINATION_DEFAULT_LIMIT", 2),
            max_limit: parse_env_with_default("PAGINATION_MAX_LIMIT", 100),
        };
        if pagination.default_limit < 1 || pagination.default_limit > pagination.max_limit {
            anyhow::bail!(
                "PAGINATION_DEFAULT_LIMIT must be between 1 and PAGINATION_MAX_LIMIT ({})",
                pagination.max_limit
            );
        }

        let config = Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_with_default("SERVER_PORT", 8000),
                workers: parse_env_with_default("SERVER_WORKERS", num_cpus::get()),
            },
            database,
            jwt: Self::jwt_from_env()?,
            graphql: GraphQLConfig {
                playground: parse_env_flag("GRAPHQL_PLAYGROUND", true),
                introspection: parse_env_flag("GRAPHQL_INTROSPECTION", true),
                max_depth: parse_env_with_default("GRAPHQL_MAX_DEPTH", 10),
                max_complexity: parse_env_with_default("GRAPHQL_MAX_COMPLEXITY", 1000),
            },
            pagination,
            pubsub: PubSubConfig {
                capacity: parse_env_with_default("PUBSUB_CAPACITY", 256),
            },
            seed_database: parse_env_flag("SEED_DATABASE", false),
        };

        info!(
            host = %config.server.host,
            port = config.server.port,
            in_memory = config.database.is_none(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Load JWT configuration from environment variables
    fn jwt_from_env() -> Result<JwtConfig> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expiry_seconds = env::var("JWT_EXPIRY_SECONDS")
            .unwrap_or_else(|_| "1800".to_string())
            .parse()
            .context("Invalid JWT_EXPIRY_SECONDS")?;

        let header_name = env::var("JWT_HEADER")
            .unwrap_or_else(|_| "x-token".to_string())
            .to_ascii_lowercase();

        Ok(JwtConfig {
            secret,
            expiry_seconds,
            header_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_jwt_env() {
        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_EXPIRY_SECONDS");
        env::remove_var("JWT_HEADER");
    }

    #[test]
    #[serial_test::serial]
    fn test_jwt_config_from_env() {
        env::set_var("JWT_SECRET", "test-secret-key");
        env::set_var("JWT_EXPIRY_SECONDS", "7200");
        env::set_var("JWT_HEADER", "X-Session");

        let config = Config::jwt_from_env().unwrap();

        assert_eq!(config.secret, "test-secret-key");
        assert_eq!(config.expiry_seconds, 7200);
        assert_eq!(config.header_name, "x-session");

        clear_jwt_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_jwt_defaults() {
        clear_jwt_env();
        env::set_var("JWT_SECRET", "test-secret-key");

        let config = Config::jwt_from_env().unwrap();
        assert_eq!(config.expiry_seconds, 1800);
        assert_eq!(config.header_name, "x-token");

        clear_jwt_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_jwt_secret_is_an_error() {
        clear_jwt_env();
        assert!(Config::jwt_from_env().is_err());
    }

    #[test]
    fn test_jwt_debug_redacts_secret() {
        let rendered = format!("{:?}", JwtConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_pagination_defaults() {
        let pagination = PaginationConfig::default();
        assert_eq!(pagination.default_limit, 2);
        assert_eq!(pagination.max_limit, 100);
    }
}
