//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `postgres://…` or `memory://`.
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub jsearch_api_key: Option<String>,
    pub jsearch_base_url: String,
    /// Applied to every call to the job provider.
    pub jsearch_timeout: Duration,
    pub uploads_dir: PathBuf,
    pub public_base_url: String,
    pub client_origin: HeaderValue,
    pub client_dist_dir: Option<PathBuf>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "0.0.0.0:5000")?;
        let database_url = required_var("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Tokens ---
        let jwt_secret = required_var("JWT_SECRET")?;
        let jwt_expires_in_days: i64 = parse_var("JWT_EXPIRES_IN_DAYS", "7")?;
        if jwt_expires_in_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_EXPIRES_IN_DAYS".to_string(),
                "must be a positive number of days".to_string(),
            ));
        }

        // --- External Job Provider (optional) ---
        let jsearch_api_key = std::env::var("JSEARCH_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let jsearch_base_url = std::env::var("JSEARCH_BASE_URL")
            .unwrap_or_else(|_| "https://jsearch.p.rapidapi.com".to_string());
        let jsearch_timeout = Duration::from_secs(parse_var("JSEARCH_TIMEOUT_SECS", "10")?);

        // --- Files and Client ---
        let uploads_dir = std::env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", bind_address.port()));
        let client_origin: HeaderValue = parse_var("CLIENT_ORIGIN", "http://localhost:3000")?;
        let client_dist_dir = std::env::var("CLIENT_DIST_DIR").ok().map(PathBuf::from);

        // --- Admin Seeding ---
        let admin_email = std::env::var("ADMIN_EMAIL").ok();
        let admin_password = std::env::var("ADMIN_PASSWORD").ok();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            jwt_expires_in_days,
            jsearch_api_key,
            jsearch_base_url,
            jsearch_timeout,
            uploads_dir,
            public_base_url,
            client_origin,
            client_dist_dir,
            admin_email,
            admin_password,
        })
    }

    /// The admin credentials, when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
