//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid realtime URL: {0}")]
    InvalidRealtimeUrl(String),

    #[error("Realtime base path must start with '/'")]
    InvalidBasePath,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Reconnect base delay must be positive and not exceed the max delay")]
    InvalidReconnectDelay,

    #[error("Cache stale time must be positive")]
    InvalidStaleTime,

    #[error("Token path must not be empty")]
    EmptyTokenPath,
}
