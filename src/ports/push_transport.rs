//! PushTransport port - Interface for the live-update channel.
//!
//! The realtime client only needs three things from a transport: open an
//! authenticated session, bind broker destinations, and yield inbound
//! messages until the session ends. Framing (STOMP) and the socket
//! (WebSocket) live in the adapter.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

/// Parameters for opening a push session.
#[derive(Debug)]
pub struct HandshakeRequest {
    /// Endpoint URL (`ws://` or `wss://`).
    pub endpoint: String,
    /// Bearer credential sent with the handshake, if any.
    pub credential: Option<Secret<String>>,
    /// Requested heartbeat interval in milliseconds, both directions. 0 disables.
    pub heartbeat_ms: u64,
}

impl HandshakeRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: None,
            heartbeat_ms: 0,
        }
    }

    pub fn with_credential(mut self, credential: Option<Secret<String>>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_heartbeat_ms(mut self, heartbeat_ms: u64) -> Self {
        self.heartbeat_ms = heartbeat_ms;
        self
    }

    /// `Authorization` header value, if a credential is present.
    pub fn authorization(&self) -> Option<String> {
        self.credential
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }
}

/// One message delivered on a bound destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub destination: String,
    pub body: String,
}

impl InboundMessage {
    pub fn new(destination: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            body: body.into(),
        }
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Handshake rejected: {0}")]
    Rejected(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Heartbeat timeout")]
    HeartbeatTimeout,

    #[error("Connection closed")]
    Closed,
}

/// An open, authenticated push session.
///
/// Owned by a single reader task; not shared.
#[async_trait]
pub trait PushSession: Send {
    /// Bind a broker destination so its messages are delivered.
    async fn subscribe(&mut self, destination: &str) -> Result<(), TransportError>;

    /// Next inbound message.
    ///
    /// `None` means the session ended cleanly from the remote side; `Some(Err)`
    /// means it failed. Either way the session is finished.
    async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>>;

    /// Close the session. Best effort.
    async fn close(&mut self);
}

/// Port for opening push sessions.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Open a session and complete its handshake.
    async fn open(&self, request: HandshakeRequest) -> Result<Box<dyn PushSession>, TransportError>;
}
