//! STOMP-over-WebSocket push transport.
//!
//! Speaks to the backend's message broker endpoint (the raw WebSocket path of
//! its SockJS endpoint). Handshake is WebSocket upgrade followed by
//! `CONNECT` / `CONNECTED`; an `ERROR` frame or early close is a failed
//! handshake.
//!
//! # Heartbeats
//!
//! Intervals are negotiated from the `heart-beat` headers. A bare EOL is sent
//! every outgoing interval; if nothing arrives for twice the incoming
//! interval the session fails with [`TransportError::HeartbeatTimeout`].

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::ports::{HandshakeRequest, InboundMessage, PushSession, PushTransport, TransportError};

use super::stomp_frame::{parse_frames, Heartbeat, StompCommand, StompFrame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens STOMP sessions over WebSocket.
#[derive(Debug, Default, Clone)]
pub struct StompTransport;

impl StompTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushTransport for StompTransport {
    async fn open(&self, request: HandshakeRequest) -> Result<Box<dyn PushSession>, TransportError> {
        let (mut socket, _response) = tokio_tungstenite::connect_async(request.endpoint.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let host = virtual_host(&request.endpoint);
        let connect = StompFrame::connect(&host, request.authorization(), request.heartbeat_ms);
        socket
            .send(Message::Text(connect.encode()))
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let server_heartbeat = await_connected(&mut socket).await?;
        let heartbeat = Heartbeat::negotiate(
            (request.heartbeat_ms, request.heartbeat_ms),
            server_heartbeat,
        );

        tracing::debug!(
            endpoint = %request.endpoint,
            outgoing_ms = heartbeat.outgoing.map(|d| d.as_millis() as u64).unwrap_or(0),
            incoming_ms = heartbeat.incoming.map(|d| d.as_millis() as u64).unwrap_or(0),
            "STOMP session established"
        );

        let now = Instant::now();
        Ok(Box::new(StompSession {
            socket,
            heartbeat,
            next_subscription: 0,
            pending: VecDeque::new(),
            last_sent: now,
            last_received: now,
        }))
    }
}

/// Host header for CONNECT: the endpoint's host name.
fn virtual_host(endpoint: &str) -> String {
    endpoint
        .parse::<http::Uri>()
        .ok()
        .and_then(|uri| uri.host().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string())
}

/// Reads until CONNECTED. Returns the server's heart-beat offer.
async fn await_connected(socket: &mut Socket) -> Result<(u64, u64), TransportError> {
    while let Some(message) = socket.next().await {
        let text = match message.map_err(|e| TransportError::Connect(e.to_string()))? {
            Message::Text(text) => text,
            Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Message::Close(_) => break,
            _ => continue,
        };

        let frames = parse_frames(&text).map_err(|e| TransportError::Protocol(e.to_string()))?;
        for frame in frames {
            match frame.command {
                StompCommand::Connected => return Ok(frame.heartbeat().unwrap_or((0, 0))),
                StompCommand::Error => {
                    let reason = frame
                        .header("message")
                        .map(str::to_string)
                        .unwrap_or(frame.body);
                    return Err(TransportError::Rejected(reason));
                }
                _ => {}
            }
        }
    }
    Err(TransportError::Closed)
}

struct StompSession {
    socket: Socket,
    heartbeat: Heartbeat,
    next_subscription: u64,
    pending: VecDeque<InboundMessage>,
    last_sent: Instant,
    last_received: Instant,
}

enum Wake {
    Socket(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    SendHeartbeat,
    Silent,
}

impl StompSession {
    async fn send_frame(&mut self, frame: StompFrame) -> Result<(), TransportError> {
        self.socket
            .send(Message::Text(frame.encode()))
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        self.last_sent = Instant::now();
        Ok(())
    }

    /// Queues MESSAGE frames from one socket message.
    fn absorb(&mut self, text: &str) -> Result<(), TransportError> {
        let frames = match parse_frames(text) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unparseable STOMP frame");
                return Ok(());
            }
        };

        for frame in frames {
            match frame.command {
                StompCommand::Message => {
                    let destination = frame.header("destination").unwrap_or_default().to_string();
                    self.pending
                        .push_back(InboundMessage::new(destination, frame.body));
                }
                StompCommand::Error => {
                    let reason = frame
                        .header("message")
                        .map(str::to_string)
                        .unwrap_or(frame.body);
                    return Err(TransportError::Protocol(reason));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl PushSession for StompSession {
    async fn subscribe(&mut self, destination: &str) -> Result<(), TransportError> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        self.send_frame(StompFrame::subscribe(&id, destination)).await
    }

    async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(Ok(message));
            }

            let send_at = self.heartbeat.outgoing.map(|d| self.last_sent + d);
            let silent_at = self
                .heartbeat
                .incoming
                .map(|d| self.last_received + d.saturating_mul(2));

            let wake = tokio::select! {
                message = self.socket.next() => Wake::Socket(message),
                _ = sleep_until_opt(send_at) => Wake::SendHeartbeat,
                _ = sleep_until_opt(silent_at) => Wake::Silent,
            };

            match wake {
                Wake::Socket(None) | Wake::Socket(Some(Ok(Message::Close(_)))) => return None,
                Wake::Socket(Some(Err(e))) => {
                    return Some(Err(TransportError::Protocol(e.to_string())))
                }
                Wake::Socket(Some(Ok(message))) => {
                    self.last_received = Instant::now();
                    let text = match message {
                        Message::Text(text) => text,
                        Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                        _ => continue,
                    };
                    if let Err(e) = self.absorb(&text) {
                        return Some(Err(e));
                    }
                }
                Wake::SendHeartbeat => {
                    if let Err(e) = self.socket.send(Message::Text("\n".to_string())).await {
                        return Some(Err(TransportError::Protocol(e.to_string())));
                    }
                    self.last_sent = Instant::now();
                }
                Wake::Silent => return Some(Err(TransportError::HeartbeatTimeout)),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.send_frame(StompFrame::disconnect()).await {
            tracing::debug!(error = %e, "DISCONNECT frame not delivered");
        }
        let _ = self.socket.close(None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_host_uses_endpoint_host() {
        assert_eq!(virtual_host("ws://academy.example.com/ws/websocket"), "academy.example.com");
        assert_eq!(virtual_host("ws://localhost:8080/ws/websocket"), "localhost");
    }

    #[test]
    fn virtual_host_falls_back_to_localhost() {
        assert_eq!(virtual_host("not a uri"), "localhost");
    }

    #[tokio::test]
    async fn open_fails_when_nothing_listens() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = StompTransport::new()
            .open(HandshakeRequest::new(format!("ws://{}/ws/websocket", addr)))
            .await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
