//! WebSocket layer: connection handling, message routing, event filtering.
//!
//! The WebSocket endpoint at `/ws` streams pool events to subscribed
//! clients and answers membership queries.

pub mod connection;
pub mod filter;
pub mod handler;
pub mod messages;
