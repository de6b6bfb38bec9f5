//! ResourceApi port - Authenticated JSON calls against the REST backend.
//!
//! Bodies cross the port as `serde_json::Value` so the trait stays object
//! safe; callers decode into typed records.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from REST calls.
///
/// `Clone` because one in-flight fetch may be awaited by several callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed ({code}): {message}")]
    Status { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid response from server: missing token")]
    MissingToken,

    #[error("Credential storage failed: {0}")]
    Credentials(String),
}

impl ApiError {
    /// Text suitable for a user-facing notification: the server's detail
    /// when there is one, else the error itself.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status behind the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Port for the REST backend. Paths are relative to the API base, e.g. `/students/7`.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError>;

    /// `body` of `None` sends no payload. An empty response yields `Value::Null`.
    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError>;

    async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ResourceApi) {}

    #[test]
    fn detail_prefers_server_message() {
        let err = ApiError::Status {
            code: 409,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.detail(), "Email already registered");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn detail_falls_back_to_display() {
        assert_eq!(ApiError::Unauthorized.detail(), "Not authenticated");
        assert_eq!(ApiError::Network("refused".into()).status(), None);
    }
}
