//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. `main` calls `dotenvy::dotenv()` first so a `.env` file works
//! in development.

use std::env;
use std::net::SocketAddr;

use bookstore_core::report::ReportOptions;
use bookstore_core::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TOP_N};
use bookstore_db::DbConfig;
use serde::Serialize;

const DEV_JWT_SECRET: &str = "bookstore-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT signing secret
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Rows in the top-books dataset
    pub report_top_n: usize,

    /// Stock at or below this counts as low stock
    pub low_stock_threshold: i64,

    /// Currency code printed in exports
    pub currency: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            bind_addr: parse(&get("BOOKSTORE_BIND_ADDR", "0.0.0.0:8080"), "BOOKSTORE_BIND_ADDR")?,

            database_path: get("BOOKSTORE_DB_PATH", "./bookstore.db"),

            db_max_connections: parse(
                &get("BOOKSTORE_DB_MAX_CONNECTIONS", "5"),
                "BOOKSTORE_DB_MAX_CONNECTIONS",
            )?,

            jwt_secret: get("JWT_SECRET", DEV_JWT_SECRET),

            jwt_lifetime_secs: parse(&get("JWT_LIFETIME_SECS", "28800"), "JWT_LIFETIME_SECS")?, // 8 hours

            report_top_n: parse(&get("REPORT_TOP_N", &DEFAULT_TOP_N.to_string()), "REPORT_TOP_N")?,

            low_stock_threshold: parse(
                &get("LOW_STOCK_THRESHOLD", &DEFAULT_LOW_STOCK_THRESHOLD.to_string()),
                "LOW_STOCK_THRESHOLD",
            )?,

            currency: get("BOOKSTORE_CURRENCY", "UGX").trim().to_uppercase(),
        };

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SECRET".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("BOOKSTORE_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if config.report_top_n == 0 {
            return Err(ConfigError::InvalidValue("REPORT_TOP_N".to_string()));
        }

        Ok(config)
    }

    /// Whether the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.report_top_n,
            low_stock_threshold: self.low_stock_threshold,
        }
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
