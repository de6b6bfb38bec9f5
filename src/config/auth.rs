//! Credential storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Authentication configuration
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// File holding the bearer token between runs.
    /// When unset, the token lives in memory only.
    pub token_path: Option<PathBuf>,

    /// Username for an interactive login at startup
    pub username: Option<String>,

    /// Password for an interactive login at startup
    pub password: Option<secrecy::Secret<String>>,
}

impl AuthConfig {
    /// Both login fields are present.
    pub fn has_login(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(path) = &self.token_path {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::EmptyTokenPath);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn test_default_has_no_token_path() {
        let config = AuthConfig::default();
        assert!(config.token_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_token_path_is_rejected() {
        let config = AuthConfig {
            token_path: Some(PathBuf::new()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyTokenPath));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut config = AuthConfig {
            username: Some("admin".to_string()),
            ..Default::default()
        };
        assert!(!config.has_login());

        config.password = Some(Secret::new("secret".to_string()));
        assert!(config.has_login());
    }
}
