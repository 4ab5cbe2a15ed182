//! Service layer: business logic orchestration.
//!
//! [`SubscriptionService`] handles the request-driven subscribe, unsubscribe
//! and listing operations and emits notices through the
//! [`super::domain::EventBus`]. [`Monitor`] is the long-running polling
//! loop that detects status changes and hands them to a
//! [`super::notify::Notifier`].

pub mod monitor;
pub mod subscription_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use monitor::{CycleReport, Monitor, MonitorSettings};
pub use subscription_service::SubscriptionService;
