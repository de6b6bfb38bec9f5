//! Domain layer - pure types with no I/O.
//!
//! - `academy` - student, batch, class, mentor and session records
//! - `foundation` - resource kinds and timestamps shared by everything else
//! - `realtime` - push events, connection states, reconnect backoff
//! - `cache` - query keys

pub mod academy;
pub mod cache;
pub mod foundation;
pub mod realtime;
