//! Realtime (push channel) configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::realtime::ReconnectPolicy;

use super::error::ValidationError;

/// Realtime configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Turn live updates off entirely
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Explicit endpoint; `http(s)://` is converted to `ws(s)://`
    pub url: Option<String>,

    /// Origin of a reverse proxy in front of the backend
    pub proxy_origin: Option<String>,

    /// Direct backend origin, used when no proxy is configured
    #[serde(default = "default_backend_origin")]
    pub backend_origin: String,

    /// Path of the broker endpoint under the origin
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// First reconnect delay in milliseconds
    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_ms: u64,

    /// Reconnect delay cap in milliseconds
    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay_ms: u64,

    /// Reconnect attempts before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// STOMP heartbeat interval in milliseconds (0 disables)
    #[serde(default = "default_heartbeat")]
    pub heartbeat_ms: u64,
}

impl RealtimeConfig {
    /// WebSocket endpoint to connect to.
    ///
    /// Resolution order: explicit `url`, then `proxy_origin + base_path`,
    /// then `backend_origin + base_path`. The broker is exposed through a
    /// SockJS endpoint, so its raw WebSocket path `<endpoint>/websocket` is used.
    pub fn endpoint(&self) -> String {
        let base = match &self.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let origin = self
                    .proxy_origin
                    .as_deref()
                    .unwrap_or(&self.backend_origin)
                    .trim_end_matches('/');
                format!("{}{}", origin, self.base_path.trim_end_matches('/'))
            }
        };

        let ws = to_ws_scheme(&base);
        if ws.ends_with("/websocket") {
            ws
        } else {
            format!("{}/websocket", ws)
        }
    }

    /// Backoff policy derived from the reconnect settings.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            max_attempts: self.max_reconnect_attempts,
        }
    }

    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for origin in [self.url.as_deref(), self.proxy_origin.as_deref(), Some(self.backend_origin.as_str())]
            .into_iter()
            .flatten()
        {
            if !has_known_scheme(origin) {
                return Err(ValidationError::InvalidRealtimeUrl(origin.to_string()));
            }
        }
        if !self.base_path.starts_with('/') {
            return Err(ValidationError::InvalidBasePath);
        }
        if self.reconnect_base_delay_ms == 0
            || self.reconnect_base_delay_ms > self.reconnect_max_delay_ms
        {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        Ok(())
    }
}

fn to_ws_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    }
}

fn has_known_scheme(url: &str) -> bool {
    ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: None,
            proxy_origin: None,
            backend_origin: default_backend_origin(),
            base_path: default_base_path(),
            reconnect_base_delay_ms: default_reconnect_base_delay(),
            reconnect_max_delay_ms: default_reconnect_max_delay(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            heartbeat_ms: default_heartbeat(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_backend_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_base_path() -> String {
    "/ws".to_string()
}

fn default_reconnect_base_delay() -> u64 {
    1000
}

fn default_reconnect_max_delay() -> u64 {
    30_000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_heartbeat() -> u64 {
    4000
}
