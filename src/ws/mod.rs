//! WebSocket layer: connection handling and command dispatch.
//!
//! The endpoint at `/ws?user_id=...` pushes status-change notifications
//! addressed to that user and accepts subscribe, unsubscribe and list
//! commands.

pub mod connection;
pub mod handler;
pub mod messages;
