//! Monitored class: URI, subscriber set, and latest snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClassDetails, ClassStatus, ClassUri, UserId};

/// A monitored class, keyed by its URI.
///
/// The store owns persisted events; everything else works on transient
/// copies that live for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique class URI (primary key).
    pub uri: ClassUri,

    /// Users to notify on status change. Each identity appears once.
    pub subscribers: BTreeSet<UserId>,

    /// Snapshot from the most recent successful poll.
    pub details: ClassDetails,

    /// When the event was first created.
    pub created_at: DateTime<Utc>,

    /// When the snapshot was last replaced by a poll.
    pub checked_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new event with a single subscriber.
    #[must_use]
    pub fn new(uri: ClassUri, details: ClassDetails, first_subscriber: UserId) -> Self {
        let now = Utc::now();
        Self {
            uri,
            subscribers: BTreeSet::from([first_subscriber]),
            details,
            created_at: now,
            checked_at: now,
        }
    }

    /// Current status of the stored snapshot.
    #[must_use]
    pub fn status(&self) -> ClassStatus {
        self.details.status
    }

    /// Returns `true` if the event takes part in polling.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.details.status.is_terminal()
    }

    /// Returns `true` if `user_id` is subscribed.
    #[must_use]
    pub fn has_subscriber(&self, user_id: &UserId) -> bool {
        self.subscribers.contains(user_id)
    }

    /// Returns a copy carrying `details` and the same subscribers.
    #[must_use]
    pub fn with_details(&self, details: ClassDetails) -> Self {
        Self {
            details,
            checked_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SeatCounts;

    fn make_event(seats_used: u32) -> Event {
        let (Ok(uri), Ok(user)) = (ClassUri::parse("https://x.edu/1"), UserId::parse("alice"))
        else {
            panic!("valid identifiers");
        };
        let details = ClassDetails::from_counts(
            "Linear Algebra",
            SeatCounts::new(10, seats_used),
            SeatCounts::new(0, 0),
        );
        Event::new(uri, details, user)
    }

    #[test]
    fn new_event_has_single_subscriber() {
        let event = make_event(3);
        assert_eq!(event.subscribers.len(), 1);
        let Ok(alice) = UserId::parse("alice") else {
            panic!("valid user");
        };
        assert!(event.has_subscriber(&alice));
    }

    #[test]
    fn completed_event_is_inactive() {
        let mut event = make_event(3);
        assert!(event.is_active());
        event.details.status = ClassStatus::Completed;
        assert!(!event.is_active());
    }

    #[test]
    fn with_details_keeps_subscribers() {
        let event = make_event(3);
        let full = ClassDetails::from_counts(
            "Linear Algebra",
            SeatCounts::new(10, 10),
            SeatCounts::new(0, 0),
        );
        let updated = event.with_details(full);
        assert_eq!(updated.status(), ClassStatus::Full);
        assert_eq!(updated.subscribers, event.subscribers);
        assert_eq!(updated.created_at, event.created_at);
    }
}
