//! In-process event store.
//!
//! [`MemoryEventStore`] keeps all events in a `HashMap` behind a
//! [`tokio::sync::RwLock`]. Every subscriber mutation happens under the
//! write lock, which makes it atomic with respect to concurrent subscribe
//! and unsubscribe calls on the same URI.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::RwLock;

use super::{EventStore, EventStream};
use crate::domain::{ClassDetails, ClassUri, Event, UserId};
use crate::error::NotifyError;

/// Event store backed by process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<ClassUri, Event>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events, active or not.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns `true` if the store holds no events.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn count_active(&self) -> Result<usize, NotifyError> {
        let map = self.events.read().await;
        Ok(map.values().filter(|event| event.is_active()).count())
    }

    async fn stream_active(&self, capacity_hint: usize) -> Result<EventStream, NotifyError> {
        let map = self.events.read().await;
        let mut active = Vec::with_capacity(capacity_hint);
        active.extend(map.values().filter(|event| event.is_active()).cloned());
        Ok(futures_util::stream::iter(active.into_iter().map(Ok)).boxed())
    }

    async fn get_by_uri(&self, uri: &ClassUri) -> Result<Event, NotifyError> {
        let map = self.events.read().await;
        map.get(uri)
            .cloned()
            .ok_or_else(|| NotifyError::NotFound(uri.clone()))
    }

    async fn get_by_subscriber(&self, user_id: &UserId) -> Result<Vec<Event>, NotifyError> {
        let map = self.events.read().await;
        let mut events: Vec<Event> = map
            .values()
            .filter(|event| event.has_subscriber(user_id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(events)
    }

    async fn create(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
        first_subscriber: &UserId,
    ) -> Result<Event, NotifyError> {
        let mut map = self.events.write().await;
        if map.contains_key(uri) {
            return Err(NotifyError::Conflict(uri.clone()));
        }
        let event = Event::new(uri.clone(), details.clone(), first_subscriber.clone());
        map.insert(uri.clone(), event.clone());
        Ok(event)
    }

    async fn add_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError> {
        let mut map = self.events.write().await;
        let event = map
            .get_mut(uri)
            .ok_or_else(|| NotifyError::NotFound(uri.clone()))?;
        event.subscribers.insert(user_id.clone());
        Ok(())
    }

    async fn remove_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError> {
        let mut map = self.events.write().await;
        let event = map
            .get_mut(uri)
            .ok_or_else(|| NotifyError::NotFound(uri.clone()))?;
        if !event.subscribers.remove(user_id) {
            return Err(NotifyError::Persist(format!(
                "{user_id} is not subscribed to {uri}"
            )));
        }
        Ok(())
    }

    async fn update_details(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
    ) -> Result<(), NotifyError> {
        let mut map = self.events.write().await;
        let event = map
            .get_mut(uri)
            .ok_or_else(|| NotifyError::NotFound(uri.clone()))?;
        event.details = details.clone();
        event.checked_at = Utc::now();
        Ok(())
    }

    async fn remove(&self, uri: &ClassUri) -> Result<(), NotifyError> {
        let mut map = self.events.write().await;
        map.remove(uri)
            .map(|_| ())
            .ok_or_else(|| NotifyError::NotFound(uri.clone()))
    }
}
