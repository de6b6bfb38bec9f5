//! Push connection lifecycle.
//!
//! ```text
//! Closed --connect--> Connecting --handshake ok--> Open
//!   ^                     |                          |
//!   +----handshake failed-+      drop / disconnect --+
//! ```

use std::fmt;

/// Lifecycle state of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
}

impl ConnectionState {
    /// Whether events can currently be received.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Closed => "closed",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_is_open() {
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(!ConnectionState::Closed.is_open());
    }

    #[test]
    fn defaults_to_closed() {
        assert_eq!(ConnectionState::default(), ConnectionState::Closed);
    }
}
