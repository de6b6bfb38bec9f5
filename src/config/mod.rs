//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `ACADEMY_CONSOLE`
//! prefix and nested values are separated by double underscores. Every
//! section has defaults, so an empty environment yields a working setup
//! against a backend on `localhost:8080`.
//!
//! # Example
//!
//! ```no_run
//! use academy_console::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Live updates from {}", config.realtime.endpoint());
//! ```

mod api;
mod auth;
mod cache;
mod error;
mod logging;
mod realtime;

pub use api::ApiConfig;
pub use auth::AuthConfig;
pub use cache::CacheConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use realtime::RealtimeConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// REST API location and timeouts
    #[serde(default)]
    pub api: ApiConfig,

    /// Push channel location, heartbeat and reconnect policy
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Query cache freshness
    #[serde(default)]
    pub cache: CacheConfig,

    /// Where the bearer token is kept
    #[serde(default)]
    pub auth: AuthConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ACADEMY_CONSOLE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ACADEMY_CONSOLE__API__URL=https://...` -> `api.url = ...`
    /// - `ACADEMY_CONSOLE__REALTIME__HEARTBEAT_MS=10000` -> `realtime.heartbeat_ms = 10000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ACADEMY_CONSOLE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.realtime.validate()?;
        self.cache.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}
