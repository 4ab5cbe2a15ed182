//! Notifier that publishes per-subscriber notices on the [`EventBus`].

use async_trait::async_trait;
use chrono::Utc;

use super::Notifier;
use crate::domain::{ClassNotice, ClassStatus, Event, EventBus};
use crate::error::NotifyError;

/// Publishes one [`ClassNotice::StatusChanged`] per subscriber.
///
/// Connected WebSocket sessions forward the notices addressed to their
/// user. A subscriber with no open session simply misses the push; that is
/// not a delivery failure.
#[derive(Debug, Clone)]
pub struct BusNotifier {
    event_bus: EventBus,
}

impl BusNotifier {
    /// Creates a notifier publishing on `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl Notifier for BusNotifier {
    async fn notify(&self, event: &Event, previous: ClassStatus) -> Result<(), NotifyError> {
        let timestamp = Utc::now();
        let mut delivered = 0usize;
        for user_id in &event.subscribers {
            let receivers = self.event_bus.publish(ClassNotice::StatusChanged {
                uri: event.uri.clone(),
                user_id: user_id.clone(),
                previous_status: previous,
                details: event.details.clone(),
                timestamp,
            });
            if receivers > 0 {
                delivered = delivered.saturating_add(1);
            }
        }
        tracing::debug!(
            uri = %event.uri,
            subscribers = event.subscribers.len(),
            delivered,
            "published status change"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ClassDetails, ClassUri, SeatCounts, UserId};

    #[tokio::test]
    async fn publishes_one_notice_per_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let notifier = BusNotifier::new(bus);

        let (Ok(uri), Ok(alice), Ok(bob)) = (
            ClassUri::parse("https://x.edu/1"),
            UserId::parse("alice"),
            UserId::parse("bob"),
        ) else {
            panic!("valid identifiers");
        };
        let details =
            ClassDetails::from_counts("Bio", SeatCounts::new(10, 10), SeatCounts::new(0, 0));
        let mut event = Event::new(uri, details, alice);
        event.subscribers.insert(bob);

        assert!(notifier.notify(&event, ClassStatus::Opened).await.is_ok());

        let mut recipients = Vec::new();
        for _ in 0..2 {
            let Ok(notice) = rx.recv().await else {
                panic!("expected notice");
            };
            assert_eq!(notice.event_type_str(), "status_changed");
            recipients.push(notice.user_id().to_string());
        }
        recipients.sort();
        assert_eq!(recipients, vec!["alice", "bob"]);
    }
}
