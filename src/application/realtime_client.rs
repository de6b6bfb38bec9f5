//! RealtimeClient - One push connection, multiplexed into per-topic handlers.
//!
//! The client owns a single transport session at a time. Each resource kind
//! is a topic; at most one handler is registered per topic and registering
//! again replaces it.
//!
//! ## Lifecycle
//!
//! ```text
//! Closed ──connect──► Connecting ──handshake ok──► Open
//!    ▲                    │                          │
//!    └────handshake err───┴──────unexpected close────┘
//!                              (reconnect scheduled)
//! ```
//!
//! `connect` never fails: a rejected handshake leaves the client closed and
//! schedules a reconnect like any other closure. Reconnects back off
//! exponentially and give up after the attempt ceiling. Each retry reads the
//! current token from the credential store, so a refreshed login is used.
//!
//! ## Shutdown
//!
//! `disconnect` is synchronous. It bumps an epoch counter so any reader or
//! timer task from before the call stands down, clears every handler, and
//! signals the reader to close without waiting for it.
//!
//! There is no handshake timeout beyond whatever the transport imposes.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use secrecy::Secret;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::domain::foundation::ResourceKind;
use crate::domain::realtime::{
    ConnectionState, RealtimeEvent, ReconnectPolicy, ReconnectState, Topic,
};
use crate::ports::{CredentialStore, HandshakeRequest, InboundMessage, PushSession, PushTransport};

/// Callback for one topic's events.
///
/// Runs on the connection's reader task, so it should return quickly.
pub trait TopicHandler: Send + Sync {
    fn handle(&self, event: RealtimeEvent);
}

impl<F> TopicHandler for F
where
    F: Fn(RealtimeEvent) + Send + Sync,
{
    fn handle(&self, event: RealtimeEvent) {
        self(event)
    }
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/ws/websocket`.
    pub endpoint: String,
    /// Heartbeat interval requested in both directions. 0 disables.
    pub heartbeat_ms: u64,
    pub policy: ReconnectPolicy,
}

impl RealtimeSettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            heartbeat_ms: 4000,
            policy: ReconnectPolicy::default(),
        }
    }

    pub fn with_heartbeat_ms(mut self, heartbeat_ms: u64) -> Self {
        self.heartbeat_ms = heartbeat_ms;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    transport: Arc<dyn PushTransport>,
    credentials: Arc<dyn CredentialStore>,
    settings: RealtimeSettings,
    handlers: RwLock<HashMap<Topic, Arc<dyn TopicHandler>>>,
    state: watch::Sender<ConnectionState>,
    /// Serializes handshakes so at most one session is ever live.
    connect_lock: tokio::sync::Mutex<()>,
    /// Bumped by `disconnect`; tasks from an older epoch do nothing.
    epoch: AtomicU64,
    reconnect: Mutex<ReconnectState>,
    reconnect_timer: Mutex<Option<JoinHandle<()>>>,
    /// Shutdown signal for the live session's reader task.
    live: Mutex<Option<oneshot::Sender<()>>>,
}

impl Inner {
    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn cancel_reconnect_timer(&self) {
        if let Some(timer) = lock(&self.reconnect_timer).take() {
            timer.abort();
        }
    }

    async fn connect(inner: Arc<Inner>, credential: Option<Secret<String>>, epoch: u64) {
        let _serial = inner.connect_lock.lock().await;

        if inner.current_epoch() != epoch {
            tracing::debug!("Connect abandoned: client was disconnected");
            return;
        }
        if inner.state().is_open() {
            return;
        }

        inner.set_state(ConnectionState::Connecting);
        tracing::debug!(endpoint = %inner.settings.endpoint, "Opening realtime connection");

        let request = HandshakeRequest::new(inner.settings.endpoint.as_str())
            .with_credential(credential)
            .with_heartbeat_ms(inner.settings.heartbeat_ms);

        let mut session = match inner.transport.open(request).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Realtime handshake failed");
                inner.on_closed(epoch);
                return;
            }
        };

        for topic in ResourceKind::ALL {
            if let Err(e) = session.subscribe(&topic.destination()).await {
                tracing::warn!(topic = %topic, error = %e, "Failed to bind topic");
                session.close().await;
                inner.on_closed(epoch);
                return;
            }
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let installed = {
            let mut live = lock(&inner.live);
            if inner.current_epoch() == epoch {
                *live = Some(shutdown_tx);
                lock(&inner.reconnect).reset();
                inner.set_state(ConnectionState::Open);
                true
            } else {
                false
            }
        };

        if !installed {
            tracing::debug!("Disconnected during handshake; closing new session");
            session.close().await;
            return;
        }

        tracing::info!(endpoint = %inner.settings.endpoint, "Realtime connection established");
        tokio::spawn(read_loop(Arc::clone(&inner), session, shutdown_rx, epoch));
    }

    /// The session ended without `disconnect`: mark closed and back off.
    fn on_closed(self: &Arc<Self>, epoch: u64) {
        {
            let mut live = lock(&self.live);
            if self.current_epoch() != epoch {
                return;
            }
            live.take();
            self.set_state(ConnectionState::Closed);
        }
        self.schedule_reconnect(epoch);
    }

    fn schedule_reconnect(self: &Arc<Self>, epoch: u64) {
        let policy = &self.settings.policy;
        let (delay, attempt) = {
            let mut reconnect = lock(&self.reconnect);
            let delay = reconnect.next_delay(policy);
            (delay, reconnect.attempts())
        };

        let Some(delay) = delay else {
            tracing::error!(
                max_attempts = policy.max_attempts,
                "Realtime reconnection abandoned; max attempts reached"
            );
            return;
        };

        tracing::info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Scheduling realtime reconnect"
        );

        let mut timer = lock(&self.reconnect_timer);
        if self.current_epoch() != epoch {
            return;
        }
        *timer = Some(tokio::spawn(reconnect_after(Arc::clone(self), epoch, delay)));
    }

    fn dispatch(&self, message: &InboundMessage) {
        let Some(topic) = Topic::from_destination(&message.destination) else {
            tracing::debug!(destination = %message.destination, "Message on unknown destination dropped");
            return;
        };

        let event = match RealtimeEvent::from_json(&message.body) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Failed to parse realtime event");
                return;
            }
        };

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .cloned();

        let Some(handler) = handler else {
            tracing::trace!(topic = %topic, kind = %event.kind, "No handler registered");
            return;
        };

        let kind = event.kind;
        if panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))).is_err() {
            tracing::error!(topic = %topic, kind = %kind, "Topic handler panicked");
        }
    }
}

fn reconnect_after(inner: Arc<Inner>, epoch: u64, delay: Duration) -> BoxFuture<'static, ()> {
    async move {
        tokio::time::sleep(delay).await;
        if inner.current_epoch() != epoch {
            return;
        }

        let credential = match inner.credentials.load().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read credential for reconnect");
                None
            }
        };
        Inner::connect(inner, credential, epoch).await;
    }
    .boxed()
}

enum Wake {
    Shutdown,
    Message(Option<Result<InboundMessage, crate::ports::TransportError>>),
}

async fn read_loop(
    inner: Arc<Inner>,
    mut session: Box<dyn PushSession>,
    mut shutdown: oneshot::Receiver<()>,
    epoch: u64,
) {
    loop {
        let wake = tokio::select! {
            _ = &mut shutdown => Wake::Shutdown,
            next = session.next_message() => Wake::Message(next),
        };

        match wake {
            Wake::Shutdown => {
                session.close().await;
                tracing::debug!("Realtime session closed by client");
                return;
            }
            Wake::Message(Some(Ok(message))) => {
                if inner.current_epoch() != epoch {
                    session.close().await;
                    tracing::debug!("Stale realtime session closed");
                    return;
                }
                inner.dispatch(&message);
            }
            Wake::Message(Some(Err(e))) => {
                tracing::warn!(error = %e, "Realtime connection lost");
                break;
            }
            Wake::Message(None) => {
                tracing::info!("Realtime connection closed by server");
                break;
            }
        }
    }

    inner.on_closed(epoch);
}

/// Handle to the realtime client. Cheap to clone; all clones share one connection.
///
/// # Example
///
/// ```ignore
/// let client = RealtimeClient::new(Arc::new(StompTransport::new()), credentials, settings);
/// client.subscribe(Topic::Students, |event: RealtimeEvent| {
///     println!("{} {}", event.kind, event.record_id());
/// });
/// client.connect(Some(token)).await;
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl RealtimeClient {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        credentials: Arc<dyn CredentialStore>,
        settings: RealtimeSettings,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Closed);
        Self {
            inner: Arc::new(Inner {
                transport,
                credentials,
                settings,
                handlers: RwLock::new(HashMap::new()),
                state,
                connect_lock: tokio::sync::Mutex::new(()),
                epoch: AtomicU64::new(0),
                reconnect: Mutex::new(ReconnectState::new()),
                reconnect_timer: Mutex::new(None),
                live: Mutex::new(None),
            }),
        }
    }

    /// Opens the connection unless it is already open.
    ///
    /// Returns once the handshake has finished either way. A failed
    /// handshake is logged and leaves the client closed with a reconnect
    /// scheduled; check [`is_connected`](Self::is_connected).
    pub async fn connect(&self, credential: Option<Secret<String>>) {
        if self.inner.state().is_open() {
            return;
        }
        self.inner.cancel_reconnect_timer();
        let epoch = self.inner.current_epoch();
        Inner::connect(Arc::clone(&self.inner), credential, epoch).await;
    }

    /// [`connect`](Self::connect) with whatever token the credential store holds.
    pub async fn connect_with_stored_credential(&self) {
        let credential = match self.inner.credentials.load().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored credential");
                None
            }
        };
        self.connect(credential).await;
    }

    /// Registers the handler for `topic`, replacing any previous one.
    pub fn subscribe<H>(&self, topic: Topic, handler: H)
    where
        H: TopicHandler + 'static,
    {
        let previous = self
            .inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic, Arc::new(handler));
        tracing::debug!(topic = %topic, replaced = previous.is_some(), "Topic handler registered");
    }

    /// Removes the handler for `topic`. Later events on it are dropped.
    pub fn unsubscribe(&self, topic: Topic) {
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&topic);
    }

    pub fn has_handler(&self, topic: Topic) -> bool {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&topic)
    }

    /// Tears down the connection, cancels any scheduled reconnect and clears
    /// every handler. Safe to call when not connected.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        let shutdown = {
            let mut live = lock(&inner.live);
            inner.epoch.fetch_add(1, Ordering::SeqCst);
            live.take()
        };

        inner.cancel_reconnect_timer();
        if let Some(shutdown) = shutdown {
            let _ = shutdown.send(());
        }

        inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        lock(&inner.reconnect).reset();
        inner.set_state(ConnectionState::Closed);

        tracing::info!("Realtime client disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state().is_open()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Receiver that observes every state change, for connectivity indicators.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        lock(&self.inner.reconnect).attempts()
    }
}
