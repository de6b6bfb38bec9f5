//! File-backed credential store
//!
//! Persists the bearer token in a single file so it survives restarts.
//! A missing or blank file means "not logged in".

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{CredentialStore, CredentialStoreError};

/// Token file on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file
    ///
    /// # Example
    /// ```ignore
    /// let store = FileCredentialStore::new("./data/jwt_token");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Secret<String>>, CredentialStoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Secret::new(token.to_string())))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialStoreError::Io(e.to_string())),
        }
    }

    async fn store(&self, token: Secret<String>) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CredentialStoreError::Io(e.to_string()))?;
        }

        fs::write(&self.path, token.expose_secret())
            .await
            .map_err(|e| CredentialStoreError::Io(e.to_string()))
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialStoreError::Io(e.to_string())),
        }
    }
}
