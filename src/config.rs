//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

/// Signing secret used outside production when `JWT_SECRET` is unset
const DEV_JWT_SECRET: &str = "driving-school-development-secret";

/// `DATABASE_URL` value selecting the in-memory stores
pub const IN_MEMORY_DATABASE_URL: &str = "memory";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HS256 signing secret for access tokens
    pub jwt_secret: String,

    pub token_ttl_hours: i64,

    /// Per-call Store timeout
    pub store_timeout_ms: u64,

    /// Bounded retry count for transient Store failures and lost CAS races
    pub store_max_retries: u32,

    /// Cap on list endpoints
    pub student_list_limit: usize,

    /// Optional JSON plan catalog replacing the built-in prices
    pub plan_catalog_path: Option<String>,

    pub revocation_purge_interval_secs: u64,

    /// Admin account created at start-up when both are set
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10)?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_or("PORT", 3000)?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "production" => {
                return Err(ConfigError::MissingEnv("JWT_SECRET"));
            }
            _ => DEV_JWT_SECRET.to_string(),
        };

        let token_ttl_hours = parse_or("TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS"));
        }

        let store_timeout_ms = parse_positive_or("STORE_TIMEOUT_MS", 5000)?;
        let store_max_retries = parse_or("STORE_MAX_RETRIES", 3)?;

        let student_list_limit = parse_or("STUDENT_LIST_LIMIT", 100)?;
        if student_list_limit == 0 {
            return Err(ConfigError::InvalidValue("STUDENT_LIST_LIMIT"));
        }

        let plan_catalog_path = non_empty_var("PLAN_CATALOG_PATH");

        let revocation_purge_interval_secs =
            parse_positive_or("REVOCATION_PURGE_INTERVAL_SECS", 300)?;

        let bootstrap_admin_email = non_empty_var("BOOTSTRAP_ADMIN_EMAIL");
        let bootstrap_admin_password = non_empty_var("BOOTSTRAP_ADMIN_PASSWORD");

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret,
            token_ttl_hours,
            store_timeout_ms,
            store_max_retries,
            student_list_limit,
            plan_catalog_path,
            revocation_purge_interval_secs,
            bootstrap_admin_email,
            bootstrap_admin_password,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if the in-memory stores were requested
    pub fn uses_in_memory_store(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE_URL
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }

    pub fn revocation_purge_interval(&self) -> Duration {
        Duration::from_secs(self.revocation_purge_interval_secs)
    }

    /// Bootstrap admin credentials, when both are configured
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        Err(_) => Ok(default),
    }
}

/// Like `parse_or`, rejecting zero
fn parse_positive_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse_or(key, default)? {
        0 => Err(ConfigError::InvalidValue(key)),
        value => Ok(value),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
