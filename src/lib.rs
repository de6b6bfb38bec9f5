//! Academy Console - client core for the academy administration backend.
//!
//! Keeps a live STOMP-over-WebSocket subscription to the backend's change
//! topics, turns change events into cache staleness and user notices, and
//! wraps the REST resources behind a query cache.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
