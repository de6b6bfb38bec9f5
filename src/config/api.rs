//! REST API configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Explicit API origin. A trailing `/api` is tolerated.
    pub url: Option<String>,

    /// Origin of a reverse proxy in front of the backend
    pub proxy_origin: Option<String>,

    /// Direct backend origin, used when no proxy is configured
    #[serde(default = "default_backend_origin")]
    pub backend_origin: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Base URL every resource path is appended to, always ending in `/api`.
    pub fn base_url(&self) -> String {
        let origin = match &self.url {
            Some(url) => {
                let trimmed = url.trim_end_matches('/');
                trimmed.strip_suffix("/api").unwrap_or(trimmed).to_string()
            }
            None => self
                .proxy_origin
                .as_deref()
                .unwrap_or(&self.backend_origin)
                .trim_end_matches('/')
                .to_string(),
        };
        format!("{}/api", origin)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate API configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for origin in [
            self.url.as_deref(),
            self.proxy_origin.as_deref(),
            Some(self.backend_origin.as_str()),
        ]
        .into_iter()
        .flatten()
        {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(ValidationError::InvalidApiUrl(origin.to_string()));
            }
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            proxy_origin: None,
            backend_origin: default_backend_origin(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_backend_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}
