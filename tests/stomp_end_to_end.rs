//! End-to-end tests for the STOMP transport against a local fake broker.
//!
//! The broker is an axum WebSocket route at `/ws/websocket` that speaks just
//! enough STOMP: CONNECTED (or ERROR) on CONNECT, records every frame, and
//! publishes its scripted events once all five topics are bound.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use secrecy::Secret;
use tokio::sync::mpsc;

use academy_console::adapters::realtime::stomp_frame::parse_frames;
use academy_console::adapters::realtime::{StompCommand, StompFrame};
use academy_console::adapters::{InMemoryCredentialStore, StompTransport};
use academy_console::application::{RealtimeClient, RealtimeSettings};
use academy_console::domain::foundation::ResourceKind;
use academy_console::domain::realtime::{
    EventAction, EventKind, EventPayload, RealtimeEvent, Topic,
};
use academy_console::ports::{HandshakeRequest, PushTransport, TransportError};

// =============================================================================
// Fake broker
// =============================================================================

#[derive(Clone, Default)]
struct Broker {
    frames: Arc<Mutex<Vec<StompFrame>>>,
    reject_with: Option<String>,
    events: Vec<(String, String)>,
    hang_up_after_events: bool,
}

impl Broker {
    fn frames(&self) -> Vec<StompFrame> {
        self.frames.lock().unwrap().clone()
    }

    fn frames_of(&self, command: StompCommand) -> Vec<StompFrame> {
        self.frames()
            .into_iter()
            .filter(|frame| frame.command == command)
            .collect()
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(broker): State<Broker>) -> Response {
    ws.on_upgrade(move |socket| serve_session(socket, broker))
}

async fn serve_session(mut socket: WebSocket, broker: Broker) {
    let mut bound = 0;
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frames) = parse_frames(&text) else {
            continue;
        };

        for frame in frames {
            broker.frames.lock().unwrap().push(frame.clone());
            match frame.command {
                StompCommand::Connect => {
                    let reply = match &broker.reject_with {
                        Some(reason) => {
                            StompFrame::new(StompCommand::Error).with_header("message", reason.as_str())
                        }
                        None => StompFrame::new(StompCommand::Connected)
                            .with_header("version", "1.2")
                            .with_header("heart-beat", "0,0"),
                    };
                    if socket.send(Message::Text(reply.encode())).await.is_err() {
                        return;
                    }
                }
                StompCommand::Subscribe => {
                    bound += 1;
                    if bound < ResourceKind::ALL.len() {
                        continue;
                    }
                    for (i, (destination, body)) in broker.events.iter().enumerate() {
                        let message = StompFrame::new(StompCommand::Message)
                            .with_header("destination", destination.as_str())
                            .with_header("subscription", "sub-0")
                            .with_header("message-id", format!("m-{}", i))
                            .with_body(body.as_str());
                        if socket.send(Message::Text(message.encode())).await.is_err() {
                            return;
                        }
                    }
                    if broker.hang_up_after_events {
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                }
                StompCommand::Disconnect => return,
                _ => {}
            }
        }
    }
}

async fn spawn_broker(broker: Broker) -> SocketAddr {
    let app = Router::new()
        .route("/ws/websocket", get(ws_handler))
        .with_state(broker);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn endpoint(addr: SocketAddr) -> String {
    format!("ws://{}/ws/websocket", addr)
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

const STUDENT_UPDATED: &str =
    r#"{"type":"STUDENT_UPDATED","payload":{"id":42,"name":"Ada"},"timestamp":"2024-03-01T10:00:00Z"}"#;

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn client_receives_events_published_by_the_broker() {
    let broker = Broker {
        events: vec![("/topic/students".to_string(), STUDENT_UPDATED.to_string())],
        ..Default::default()
    };
    let addr = spawn_broker(broker.clone()).await;

    let client = RealtimeClient::new(
        Arc::new(StompTransport::new()),
        Arc::new(InMemoryCredentialStore::new()),
        RealtimeSettings::new(endpoint(addr)),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.subscribe(Topic::Students, move |event: RealtimeEvent| {
        let _ = tx.send(event);
    });

    client.connect(Some(Secret::new("jwt-abc".to_string()))).await;
    assert!(client.is_connected());

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event not delivered")
        .expect("handler channel closed");
    let expected = RealtimeEvent::new(
        EventKind::new(ResourceKind::Students, EventAction::Updated),
        EventPayload::new(42).with_field("name", "Ada"),
        "2024-03-01T10:00:00Z",
    );
    assert_eq!(event, expected);

    client.disconnect();
}

#[tokio::test]
async fn connect_frame_carries_credential_and_heartbeat() {
    let broker = Broker::default();
    let addr = spawn_broker(broker.clone()).await;

    let client = RealtimeClient::new(
        Arc::new(StompTransport::new()),
        Arc::new(InMemoryCredentialStore::with_token("stored-token")),
        RealtimeSettings::new(endpoint(addr)),
    );
    client.connect_with_stored_credential().await;
    assert!(eventually(|| broker.frames_of(StompCommand::Subscribe).len() == 5).await);

    let connect = &broker.frames_of(StompCommand::Connect)[0];
    assert_eq!(connect.header("Authorization"), Some("Bearer stored-token"));
    assert_eq!(connect.header("heart-beat"), Some("4000,4000"));
    assert_eq!(connect.header("host"), Some("127.0.0.1"));
    assert!(connect.header("accept-version").unwrap().contains("1.2"));

    let subscriptions: Vec<(String, String)> = broker
        .frames_of(StompCommand::Subscribe)
        .iter()
        .map(|frame| {
            (
                frame.header("id").unwrap_or_default().to_string(),
                frame.header("destination").unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        subscriptions,
        vec![
            ("sub-0".to_string(), "/topic/students".to_string()),
            ("sub-1".to_string(), "/topic/batches".to_string()),
            ("sub-2".to_string(), "/topic/classes".to_string()),
            ("sub-3".to_string(), "/topic/mentors".to_string()),
            ("sub-4".to_string(), "/topic/mentorSessions".to_string()),
        ]
    );

    client.disconnect();
}

#[tokio::test]
async fn error_frame_rejects_the_handshake() {
    let broker = Broker {
        reject_with: Some("Invalid token".to_string()),
        ..Default::default()
    };
    let addr = spawn_broker(broker).await;

    let result = StompTransport::new()
        .open(HandshakeRequest::new(endpoint(addr)).with_heartbeat_ms(4000))
        .await;

    match result {
        Err(TransportError::Rejected(reason)) => assert_eq!(reason, "Invalid token"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("handshake should have been rejected"),
    }
}

#[tokio::test]
async fn rejected_handshake_leaves_client_closed() {
    let broker = Broker {
        reject_with: Some("Invalid token".to_string()),
        ..Default::default()
    };
    let addr = spawn_broker(broker).await;

    let client = RealtimeClient::new(
        Arc::new(StompTransport::new()),
        Arc::new(InMemoryCredentialStore::new()),
        RealtimeSettings::new(endpoint(addr)),
    );
    client.connect(None).await;

    assert!(!client.is_connected());
    assert_eq!(client.reconnect_attempts(), 1);
    client.disconnect();
}

#[tokio::test]
async fn disconnect_sends_disconnect_frame() {
    let broker = Broker::default();
    let addr = spawn_broker(broker.clone()).await;

    let client = RealtimeClient::new(
        Arc::new(StompTransport::new()),
        Arc::new(InMemoryCredentialStore::new()),
        RealtimeSettings::new(endpoint(addr)),
    );
    client.connect(None).await;
    assert!(client.is_connected());

    client.disconnect();

    assert!(eventually(|| !broker.frames_of(StompCommand::Disconnect).is_empty()).await);
}

#[tokio::test]
async fn broker_hang_up_ends_the_session() {
    let broker = Broker {
        events: vec![("/topic/batches".to_string(), STUDENT_UPDATED.to_string())],
        hang_up_after_events: true,
        ..Default::default()
    };
    let addr = spawn_broker(broker).await;

    let mut session = StompTransport::new()
        .open(HandshakeRequest::new(endpoint(addr)))
        .await
        .unwrap();
    for topic in ResourceKind::ALL {
        session.subscribe(&topic.destination()).await.unwrap();
    }

    let first = session.next_message().await.unwrap().unwrap();
    assert_eq!(first.destination, "/topic/batches");
    assert_eq!(first.body, STUDENT_UPDATED);

    let next = tokio::time::timeout(Duration::from_secs(5), session.next_message())
        .await
        .expect("session did not end");
    assert!(matches!(next, None | Some(Err(_))));
}
