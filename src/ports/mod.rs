//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application layer and the outside world. Adapters implement these ports.
//!
//! - `PushTransport` / `PushSession` - live-update channel
//! - `CredentialStore` - bearer token storage
//! - `Notifier` - user-facing notifications
//! - `LoginRedirect` - reaction to an expired session
//! - `ResourceApi` - REST backend

mod credential_store;
mod login_redirect;
mod notifier;
mod push_transport;
mod resource_api;

pub use credential_store::{CredentialStore, CredentialStoreError};
pub use login_redirect::LoginRedirect;
pub use notifier::{Notification, NotificationLevel, Notifier};
pub use push_transport::{HandshakeRequest, InboundMessage, PushSession, PushTransport, TransportError};
pub use resource_api::{ApiError, ResourceApi};
