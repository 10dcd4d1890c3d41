// Configuration management

use crate::core::errors::AppError;
use secrecy::{ExposeSecret, Secret};
use std::env;
use std::fmt;

const MIN_JWT_SECRET_LEN: usize = 32;

/// Upper bound for `TOKEN_TTL_SECS` (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration loaded from environment variables
///
/// Supports both database-backed and in-memory operation modes.
/// All configuration is validated on load with clear error messages.
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Database configuration (optional, in-memory store when unset)
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Token configuration
    pub jwt_secret: Secret<String>,
    pub token_ttl_secs: u64,

    // Password hashing cost
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,

    // HTTP configuration
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("jwt_secret", &"<REDACTED>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("password_hash_memory_kib", &self.password_hash_memory_kib)
            .field("password_hash_iterations", &self.password_hash_iterations)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("body_size_limit_bytes", &self.body_size_limit_bytes)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (development)
        // Skip in test environment to avoid interfering with test environment variables
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok(); // Ignore errors (file may not exist)
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hash_defaults = argon2::Config::default();

        let config = Self {
            bind_address: Self::get_or_default(&lookup, "BIND_ADDRESS", "0.0.0.0"),
            port: Self::parse_port(&lookup)?,
            database_url: Self::get_optional(&lookup, "DATABASE_URL"),
            database_max_connections: Self::parse_or_default(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: Secret::new(Self::get_required(&lookup, "JWT_SECRET")?),
            token_ttl_secs: Self::parse_or_default(&lookup, "TOKEN_TTL_SECS", 2 * 60 * 60)?,
            password_hash_memory_kib: Self::parse_or_default(
                &lookup,
                "PASSWORD_HASH_MEMORY_KIB",
                hash_defaults.mem_cost,
            )?,
            password_hash_iterations: Self::parse_or_default(
                &lookup,
                "PASSWORD_HASH_ITERATIONS",
                hash_defaults.time_cost,
            )?,
            cors_allowed_origins: Self::parse_list(
                &Self::get_or_default(&lookup, "CORS_ALLOWED_ORIGINS", "http://localhost:5173"),
            ),
            request_timeout_secs: Self::parse_or_default(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            body_size_limit_bytes: Self::parse_or_default(&lookup, "BODY_SIZE_LIMIT_BYTES", 1024 * 1024)?,
            log_level: Self::get_or_default(&lookup, "LOG_LEVEL", "info"),
            log_format: Self::get_or_default(&lookup, "LOG_FORMAT", "json"),
        };

        // Post-load validation
        config.validate()?;

        Ok(config)
    }

    /// Get value or return default
    fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(key).unwrap_or_else(|| default.to_string())
    }

    /// Get optional value, treating empty as unset
    fn get_optional<F>(lookup: &F, key: &str) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(key).filter(|value| !value.is_empty())
    }

    /// Get required value
    fn get_required<F>(lookup: &F, key: &str) -> Result<String, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(key)
            .ok_or_else(|| AppError::Configuration(format!("{} not set", key)))?;

        if value.is_empty() {
            return Err(AppError::Configuration(format!("{} is empty", key)));
        }

        Ok(value)
    }

    /// Parse port from PORT
    fn parse_port<F>(lookup: &F) -> Result<u16, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_str = lookup("PORT").unwrap_or_else(|| "8080".to_string());
        let port = port_str.parse::<u16>().map_err(|e| {
            AppError::Configuration(format!("Invalid PORT value '{}': {}", port_str, e))
        })?;

        if port == 0 {
            return Err(AppError::Configuration(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }

        Ok(port)
    }

    /// Parse a positive number or return default
    fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr + PartialEq + Default,
        T::Err: fmt::Display,
    {
        match lookup(key) {
            Some(value) => {
                let parsed = value.parse::<T>().map_err(|e| {
                    AppError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == T::default() {
                    return Err(AppError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }

                Ok(parsed)
            }
            None => Ok(default),
        }
    }

    /// Split a comma separated list, dropping blanks
    fn parse_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validate all configuration values
    fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::Configuration(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AppError::Configuration(format!(
                "TOKEN_TTL_SECS must be at most {} (one year)",
                MAX_TOKEN_TTL_SECS
            )));
        }

        if let Some(ref url) = self.database_url {
            Self::validate_url(url, "Database")?;
        }

        for origin in &self.cors_allowed_origins {
            Self::validate_url(origin, "CORS origin")?;
        }

        // Argon2 needs at least 8 KiB per lane
        if self.password_hash_memory_kib < 8 {
            return Err(AppError::Configuration(
                "PASSWORD_HASH_MEMORY_KIB must be at least 8".to_string(),
            ));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    /// Validate URL format
    fn validate_url(url: &str, description: &str) -> Result<(), AppError> {
        url::Url::parse(url).map_err(|e| {
            // Database URLs carry credentials; only the parse error is reported
            AppError::Configuration(format!("Invalid {} URL: {}", description, e))
        })?;
        Ok(())
    }

    /// Validate log level
    fn validate_log_level(level: &str) -> Result<(), AppError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(AppError::Configuration(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    /// Validate log format
    fn validate_log_format(format: &str) -> Result<(), AppError> {
        if format != "json" && format != "text" {
            return Err(AppError::Configuration(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }

    /// Create a test configuration
    ///
    /// Bypasses environment loading. Uses the in-memory store and a cheap
    /// password hashing cost so tests stay fast.
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            database_max_connections: 10,
            jwt_secret: Secret::new("test-secret-that-is-at-least-32-bytes-long".to_string()),
            token_ttl_secs: 2 * 60 * 60,
            password_hash_memory_kib: 64,
            password_hash_iterations: 1,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            body_size_limit_bytes: 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}
