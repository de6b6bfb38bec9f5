//! In-memory credential store.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};

use crate::ports::{CredentialStore, CredentialStoreError};

/// Keeps the token for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<Secret<String>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(Secret::new(token.into()))),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<Secret<String>>, CredentialStoreError> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|token| Secret::new(token.expose_secret().clone())))
    }

    async fn store(&self, token: Secret<String>) -> Result<(), CredentialStoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let store = InMemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_then_load_returns_latest_token() {
        let store = InMemoryCredentialStore::with_token("old");
        store.store(Secret::new("new".to_string())).await.unwrap();

        let token = store.load().await.unwrap().unwrap();
        assert_eq!(token.expose_secret(), "new");
    }

    #[tokio::test]
    async fn clear_forgets_token() {
        let store = InMemoryCredentialStore::with_token("abc");
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
