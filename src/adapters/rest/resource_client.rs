//! Authenticated REST client.
//!
//! Every request carries `Authorization: Bearer <token>` when the credential
//! store holds one. A 401 clears the stored token and hands control to the
//! host's [`LoginRedirect`] before surfacing [`ApiError::Unauthorized`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::ports::{ApiError, CredentialStore, LoginRedirect, ResourceApi};

use super::problem::error_from_response;

/// `ResourceApi` over HTTP.
pub struct HttpResourceClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl HttpResourceClient {
    /// Creates a client for `base_url` (already ending in `/api`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            redirect,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.load().await {
            Ok(Some(token)) => request.bearer_auth(token.expose_secret()),
            Ok(None) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored credential; sending unauthenticated");
                request
            }
        }
    }

    async fn on_unauthorized(&self, path: &str) {
        tracing::info!(path = %path, "Backend rejected credential");
        if let Err(e) = self.credentials.clear().await {
            tracing::warn!(error = %e, "Failed to clear rejected credential");
        }
        self.redirect.redirect_to_login();
    }

    /// Sends a request and decodes the body. Empty bodies yield `Value::Null`.
    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(path = %path, status = status.as_u16(), "REST response");

        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized(path).await;
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(error_from_response(path, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ResourceApi for HttpResourceClient {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let request = self.http.get(self.url(path)).query(query);
        self.send(path, request).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(path, request).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let request = self.http.put(self.url(path)).json(&body);
        self.send(path, request).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(path));
        self.send(path, request).await.map(|_| ())
    }
}
