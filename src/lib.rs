//! # class-notify
//!
//! Watches university class enrollment pages and notifies subscribed users
//! when a class changes between opened, waitlisted, and full.
//!
//! Users subscribe to a class by its page URI over REST or WebSocket. A
//! background monitor re-fetches every active class each cycle through a
//! school-specific status provider, stores the fresh snapshot, and hands
//! status changes to the configured notifiers.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SubscriptionService (service/)      Monitor (service/)
//!     ├── EventBus (domain/)  ◄── BusNotifier, WebhookNotifier (notify/)
//!     │                                       StatusProvider (provider/)
//!     │
//!     └── EventStore: memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod provider;
pub mod service;
pub mod ws;
