//! In-memory push transport for testing.
//!
//! Lets tests script handshake outcomes, push messages into the live session,
//! and drop the connection from the "server" side.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::sync::mpsc;

use crate::ports::{HandshakeRequest, InboundMessage, PushSession, PushTransport, TransportError};

enum ServerSide {
    Deliver(InboundMessage),
    Drop,
}

#[derive(Default)]
struct State {
    fail_next: u32,
    fail_always: bool,
    opens: usize,
    credentials: Vec<Option<String>>,
    subscriptions: Vec<String>,
    client_closes: usize,
    next_session: u64,
    live: Option<(u64, mpsc::UnboundedSender<ServerSide>)>,
}

/// Scriptable in-memory transport.
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(InMemoryPushTransport::new());
/// let client = RealtimeClient::new(transport.clone(), credentials, settings);
///
/// client.connect(None).await;
/// transport.push("/topic/students", r#"{"type":"STUDENT_CREATED",...}"#);
/// transport.drop_connection();
/// ```
#[derive(Clone, Default)]
pub struct InMemoryPushTransport {
    state: Arc<Mutex<State>>,
}

impl InMemoryPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .expect("InMemoryPushTransport: state lock poisoned")
    }

    // === Scripting ===

    /// Fail the next `count` handshakes.
    pub fn fail_next_handshakes(&self, count: u32) {
        self.state().fail_next = count;
    }

    /// Fail every handshake until reset with `false`.
    pub fn fail_all_handshakes(&self, fail: bool) {
        self.state().fail_always = fail;
    }

    /// Deliver a message on the live session. Returns false if none is live.
    pub fn push(&self, destination: &str, body: &str) -> bool {
        let state = self.state();
        match &state.live {
            Some((_, tx)) => tx
                .send(ServerSide::Deliver(InboundMessage::new(destination, body)))
                .is_ok(),
            None => false,
        }
    }

    /// Close the live session from the server side.
    pub fn drop_connection(&self) {
        let mut state = self.state();
        if let Some((_, tx)) = state.live.take() {
            let _ = tx.send(ServerSide::Drop);
        }
    }

    // === Assertions ===

    /// Handshakes attempted, successful or not.
    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    /// Credential presented on each handshake, in order.
    pub fn credentials_seen(&self) -> Vec<Option<String>> {
        self.state().credentials.clone()
    }

    /// Destinations bound, across all sessions.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state().subscriptions.clone()
    }

    /// Sessions closed by the client.
    pub fn client_close_count(&self) -> usize {
        self.state().client_closes
    }

    pub fn has_live_session(&self) -> bool {
        self.state().live.is_some()
    }
}

#[async_trait]
impl PushTransport for InMemoryPushTransport {
    async fn open(&self, request: HandshakeRequest) -> Result<Box<dyn PushSession>, TransportError> {
        let mut state = self.state();
        state.opens += 1;
        state.credentials.push(
            request
                .credential
                .as_ref()
                .map(|token| token.expose_secret().clone()),
        );

        if state.fail_always {
            return Err(TransportError::Connect("scripted failure".to_string()));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(TransportError::Rejected("scripted rejection".to_string()));
        }

        state.next_session += 1;
        let id = state.next_session;
        let (tx, rx) = mpsc::unbounded_channel();
        state.live = Some((id, tx));
        Ok(Box::new(InMemorySession {
            id,
            inbound: rx,
            state: Arc::clone(&self.state),
        }))
    }
}

struct InMemorySession {
    id: u64,
    inbound: mpsc::UnboundedReceiver<ServerSide>,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl PushSession for InMemorySession {
    async fn subscribe(&mut self, destination: &str) -> Result<(), TransportError> {
        self.state
            .lock()
            .expect("InMemoryPushTransport: state lock poisoned")
            .subscriptions
            .push(destination.to_string());
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        match self.inbound.recv().await {
            Some(ServerSide::Deliver(message)) => Some(Ok(message)),
            Some(ServerSide::Drop) | None => None,
        }
    }

    async fn close(&mut self) {
        let mut state = self
            .state
            .lock()
            .expect("InMemoryPushTransport: state lock poisoned");
        state.client_closes += 1;
        // A newer session may already be live.
        if matches!(state.live, Some((id, _)) if id == self.id) {
            state.live = None;
        }
    }
}
