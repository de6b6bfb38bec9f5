//! Push transport adapters.
//!
//! - [`StompTransport`] - STOMP 1.2 over WebSocket, for the real backend
//! - [`InMemoryPushTransport`] - scriptable transport for tests

mod in_memory;
pub mod stomp_frame;
mod stomp_transport;

pub use in_memory::InMemoryPushTransport;
pub use stomp_frame::{FrameError, StompCommand, StompFrame};
pub use stomp_transport::StompTransport;
