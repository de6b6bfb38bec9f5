//! Realtime domain - push events, connection lifecycle, reconnect backoff.
//!
//! Topics are the resource kinds themselves: the backend publishes one
//! channel per kind, never per record.

mod connection;
mod event;
mod reconnect;

pub use connection::ConnectionState;
pub use event::{EventAction, EventKind, EventParseError, EventPayload, RealtimeEvent};
pub use reconnect::{ReconnectPolicy, ReconnectState};

/// A push topic. One per resource kind.
pub type Topic = crate::domain::foundation::ResourceKind;
