//! Class DTOs: the public view of a monitored event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClassStatus, ClassUri, Event};

/// Query string carrying a class URI (`?uri=...`).
#[derive(Debug, Clone, Deserialize)]
pub struct UriQuery {
    /// Class page URI.
    pub uri: String,
}

/// A monitored class as returned by the REST and WebSocket front ends.
///
/// Subscriber identities are not exposed; only their count is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDto {
    /// Class page URI.
    pub uri: ClassUri,
    /// Class title.
    pub name: String,
    /// Free-form description, possibly empty.
    pub description: String,
    /// Latest observed status.
    pub status: ClassStatus,
    /// Seat capacity.
    pub seats_total: u32,
    /// Free seats.
    pub seats_remaining: u32,
    /// Waitlist capacity.
    pub waitlist_total: u32,
    /// Free waitlist slots.
    pub waitlist_remaining: u32,
    /// Number of users watching this class.
    pub subscriber_count: usize,
    /// When the class was first subscribed to.
    pub created_at: DateTime<Utc>,
    /// When the snapshot was last refreshed.
    pub checked_at: DateTime<Utc>,
}

impl From<&Event> for ClassDto {
    fn from(event: &Event) -> Self {
        let details = &event.details;
        Self {
            uri: event.uri.clone(),
            name: details.name.clone(),
            description: details.description.clone(),
            status: details.status,
            seats_total: details.seats_total,
            seats_remaining: details.seats_remaining,
            waitlist_total: details.waitlist_total,
            waitlist_remaining: details.waitlist_remaining,
            subscriber_count: event.subscribers.len(),
            created_at: event.created_at,
            checked_at: event.checked_at,
        }
    }
}

impl From<Event> for ClassDto {
    fn from(event: Event) -> Self {
        Self::from(&event)
    }
}
