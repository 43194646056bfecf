//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` pushes booking status updates to clients that
//! subscribe by order id. It is advisory; the REST status query is the
//! authoritative read.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
