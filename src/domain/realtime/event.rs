//! Change events pushed by the backend.
//!
//! Wire shape, one JSON object per message:
//!
//! ```text
//! { "type": "STUDENT_CREATED", "payload": { "id": 42, "email": "..." }, "timestamp": "2024-01-01T00:00:00Z" }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ResourceKind, Timestamp};

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Created => "CREATED",
            EventAction::Updated => "UPDATED",
            EventAction::Deleted => "DELETED",
        }
    }

    const ALL: [EventAction; 3] = [EventAction::Created, EventAction::Updated, EventAction::Deleted];
}

/// One of the fifteen event tags, e.g. `MENTOR_SESSION_UPDATED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventKind {
    pub resource: ResourceKind,
    pub action: EventAction,
}

impl EventKind {
    pub fn new(resource: ResourceKind, action: EventAction) -> Self {
        Self { resource, action }
    }

    /// Every valid tag.
    pub fn all() -> impl Iterator<Item = EventKind> {
        ResourceKind::ALL.into_iter().flat_map(|resource| {
            EventAction::ALL
                .into_iter()
                .map(move |action| EventKind::new(resource, action))
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.resource.event_prefix(), self.action.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Prefixes overlap (MENTOR vs MENTOR_SESSION), so match the whole prefix.
        for action in EventAction::ALL {
            let Some(prefix) = s
                .strip_suffix(action.as_str())
                .and_then(|rest| rest.strip_suffix('_'))
            else {
                continue;
            };
            if let Some(resource) = ResourceKind::ALL
                .into_iter()
                .find(|kind| kind.event_prefix() == prefix)
            {
                return Ok(EventKind::new(resource, action));
            }
        }
        Err(EventParseError::UnknownKind(s.to_string()))
    }
}

impl TryFrom<String> for EventKind {
    type Error = EventParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.to_string()
    }
}

/// Event body. `id` is always present; any other fields are kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub id: i64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl EventPayload {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A decoded push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: EventPayload,
    /// Kept verbatim; see [`RealtimeEvent::occurred_at`] for a parsed view.
    pub timestamp: String,
}

impl RealtimeEvent {
    pub fn new(kind: EventKind, payload: EventPayload, timestamp: impl Into<String>) -> Self {
        Self {
            kind,
            payload,
            timestamp: timestamp.into(),
        }
    }

    /// Decodes one message body.
    pub fn from_json(body: &str) -> Result<Self, EventParseError> {
        serde_json::from_str(body).map_err(|e| EventParseError::Malformed(e.to_string()))
    }

    /// Identifier of the affected record.
    pub fn record_id(&self) -> i64 {
        self.payload.id
    }

    /// Parsed timestamp, if the server sent a valid instant.
    pub fn occurred_at(&self) -> Option<Timestamp> {
        Timestamp::parse_rfc3339(&self.timestamp)
    }
}

/// Errors decoding a push message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("Unknown event type: {0}")]
    UnknownKind(String),

    #[error("Malformed event: {0}")]
    Malformed(String),
}
