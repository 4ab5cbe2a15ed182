//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::SubscriptionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Subscription service for all request-driven business logic.
    pub subscriptions: Arc<SubscriptionService>,
    /// Event bus for WebSocket notification delivery.
    pub event_bus: EventBus,
    /// School ids with a registered status provider.
    pub schools: Arc<[&'static str]>,
}

impl AppState {
    /// Creates state sharing the service's event bus.
    #[must_use]
    pub fn new(subscriptions: Arc<SubscriptionService>, schools: Vec<&'static str>) -> Self {
        let event_bus = subscriptions.event_bus().clone();
        Self {
            subscriptions,
            event_bus,
            schools: schools.into(),
        }
    }
}
