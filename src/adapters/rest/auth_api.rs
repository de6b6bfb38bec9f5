//! Login and token validation endpoints.
//!
//! These calls go around [`HttpResourceClient`](super::HttpResourceClient):
//! a rejected login is an ordinary failure, not an expired session, so it
//! must not clear credentials or trigger the login redirect.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::ports::{ApiError, CredentialStore};

use super::problem::problem_message;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawAuthResponse {
    token: Option<String>,
    #[serde(rename = "type")]
    token_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

/// Successful login.
#[derive(Debug)]
pub struct AuthResponse {
    pub token: Secret<String>,
    /// Token scheme reported by the server, normally `Bearer`.
    pub token_type: String,
}

/// Result of asking the backend whether a token is still good.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenValidation {
    #[serde(default)]
    pub valid: bool,
    pub username: Option<String>,
    pub error: Option<String>,
}

/// Client for `/auth/*`.
pub struct AuthApi {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthApi {
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Logs in and stores the returned token.
    ///
    /// # Errors
    ///
    /// - `ApiError::Status` with the server's detail, or `Login failed: <code>`
    /// - `ApiError::MissingToken` if a 2xx response carries no token
    /// - `ApiError::Network` if the server cannot be reached
    pub async fn login(&self, username: &str, password: &Secret<String>) -> Result<AuthResponse, ApiError> {
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest {
                username,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Could not reach server: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(username = %username, status = status.as_u16(), "Login rejected");
            return Err(ApiError::Status {
                code: status.as_u16(),
                message: problem_message(&body, format!("Login failed: {}", status.as_u16())),
            });
        }

        let raw: RawAuthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let token = raw
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;

        self.credentials
            .store(Secret::new(token.clone()))
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;

        tracing::info!(username = %username, "Login successful");
        Ok(AuthResponse {
            token: Secret::new(token),
            token_type: raw.token_type.unwrap_or_else(|| "Bearer".to_string()),
        })
    }

    /// Asks the backend whether `token` is valid.
    pub async fn validate_token(&self, token: &Secret<String>) -> Result<TokenValidation, ApiError> {
        let response = self
            .http
            .post(format!("{}/auth/validate", self.base_url))
            .json(&TokenRequest {
                token: token.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                message: problem_message(&body, super::problem::status_text(status)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Validates whatever token the credential store currently holds.
    /// `Ok(None)` when there is none.
    pub async fn validate_stored(&self) -> Result<Option<TokenValidation>, ApiError> {
        let token = self
            .credentials
            .load()
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;
        match token {
            Some(token) => self.validate_token(&token).await.map(Some),
            None => Ok(None),
        }
    }
}
