//! Query cache configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Query cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Seconds a fetched result counts as fresh
    #[serde(default = "default_stale_time")]
    pub stale_time_secs: u64,
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stale_time_secs == 0 {
            return Err(ValidationError::InvalidStaleTime);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time(),
        }
    }
}

fn default_stale_time() -> u64 {
    300
}
