//! CredentialStore port - Where the host keeps its bearer token.
//!
//! Read on every REST request and on every reconnect attempt, so a token
//! refreshed after the first connect is picked up automatically.

use async_trait::async_trait;
use secrecy::Secret;
use thiserror::Error;

/// Errors from credential storage.
#[derive(Debug, Clone, Error)]
pub enum CredentialStoreError {
    #[error("IO error: {0}")]
    Io(String),
}

/// Port for storing the current bearer token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current token, if logged in.
    async fn load(&self) -> Result<Option<Secret<String>>, CredentialStoreError>;

    /// Replace the stored token.
    async fn store(&self, token: Secret<String>) -> Result<(), CredentialStoreError>;

    /// Forget the stored token.
    async fn clear(&self) -> Result<(), CredentialStoreError>;
}
