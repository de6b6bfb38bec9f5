//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `credentials` - token storage (in-memory, file)
//! - `notifications` - notification sinks (tracing, recording)
//! - `realtime` - push transports (STOMP over WebSocket, in-memory)
//! - `rest` - REST backend over `reqwest`

pub mod credentials;
pub mod notifications;
pub mod realtime;
pub mod rest;

pub use credentials::{FileCredentialStore, InMemoryCredentialStore};
pub use notifications::{RecordingNotifier, TracingNotifier};
pub use realtime::{InMemoryPushTransport, StompTransport};
pub use rest::{AuthApi, FlagLoginRedirect, HttpResourceClient};
