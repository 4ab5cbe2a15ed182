//! Subscription service: subscribe, unsubscribe, and list operations.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{ClassNotice, ClassUri, Event, EventBus, UserId};
use crate::error::{NotifyError, Operation, SubscriptionError};
use crate::persistence::EventStore;
use crate::provider::StatusProvider;

/// Orchestration layer for subscription lifecycle operations.
///
/// Stateless coordinator: all state lives in the [`EventStore`]. Every
/// mutation follows the pattern: look up → mutate store → emit notice →
/// return the event. Failures are wrapped with the operation, URI, and
/// user; nothing is retried.
#[derive(Debug, Clone)]
pub struct SubscriptionService {
    store: Arc<dyn EventStore>,
    provider: Arc<dyn StatusProvider>,
    event_bus: EventBus,
}

impl SubscriptionService {
    /// Creates a new `SubscriptionService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        provider: Arc<dyn StatusProvider>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            provider,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the school id of the active status provider.
    #[must_use]
    pub fn school(&self) -> &'static str {
        self.provider.school()
    }

    /// Subscribes `user_id` to the class at `uri`.
    ///
    /// An existing event gains the subscriber and is returned with its
    /// stored snapshot. An unseen URI is fetched once and a new event is
    /// created with `user_id` as its only subscriber. Subscribing twice is
    /// a no-op success.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::Lookup`] if the store fails for a
    /// reason other than not-found, [`SubscriptionError::Fetch`] if the
    /// first status fetch fails, and [`SubscriptionError::Persist`] if the
    /// event cannot be created or the subscriber cannot be added.
    pub async fn subscribe(
        &self,
        uri: &ClassUri,
        user_id: &UserId,
    ) -> Result<Event, SubscriptionError> {
        let event = match self.store.get_by_uri(uri).await {
            Ok(event) => self.add_to_existing(event, user_id).await?,
            Err(NotifyError::NotFound(_)) => self.create_event(uri, user_id).await?,
            Err(source) => {
                return Err(SubscriptionError::Lookup {
                    operation: Operation::Subscribe,
                    uri: uri.clone(),
                    user_id: user_id.clone(),
                    source,
                });
            }
        };

        let _ = self.event_bus.publish(ClassNotice::Subscribed {
            uri: uri.clone(),
            user_id: user_id.clone(),
            class_name: event.details.name.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(%uri, %user_id, "user subscribed");
        Ok(event)
    }

    async fn add_to_existing(
        &self,
        mut event: Event,
        user_id: &UserId,
    ) -> Result<Event, SubscriptionError> {
        self.store
            .add_subscriber(&event.uri, user_id)
            .await
            .map_err(|source| SubscriptionError::Persist {
                operation: Operation::Subscribe,
                uri: event.uri.clone(),
                user_id: user_id.clone(),
                source,
            })?;
        event.subscribers.insert(user_id.clone());
        Ok(event)
    }

    async fn create_event(
        &self,
        uri: &ClassUri,
        user_id: &UserId,
    ) -> Result<Event, SubscriptionError> {
        let details =
            self.provider
                .fetch_status(uri)
                .await
                .map_err(|source| SubscriptionError::Fetch {
                    operation: Operation::Subscribe,
                    uri: uri.clone(),
                    user_id: user_id.clone(),
                    source,
                })?;

        match self.store.create(uri, &details, user_id).await {
            Ok(event) => {
                tracing::info!(%uri, status = %event.details.status, "created class event");
                Ok(event)
            }
            // Another request created the event between lookup and create.
            Err(NotifyError::Conflict(_)) => {
                let existing = self.store.get_by_uri(uri).await.map_err(|source| {
                    SubscriptionError::Lookup {
                        operation: Operation::Subscribe,
                        uri: uri.clone(),
                        user_id: user_id.clone(),
                        source,
                    }
                })?;
                self.add_to_existing(existing, user_id).await
            }
            Err(source) => Err(SubscriptionError::Persist {
                operation: Operation::Subscribe,
                uri: uri.clone(),
                user_id: user_id.clone(),
                source,
            }),
        }
    }

    /// Unsubscribes `user_id` from the class at `uri`.
    ///
    /// Returns the event with the subscriber already removed.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::NotFound`] if no event exists for `uri`
    /// and [`SubscriptionError::Persist`] if the user was not subscribed or
    /// the store fails.
    pub async fn unsubscribe(
        &self,
        uri: &ClassUri,
        user_id: &UserId,
    ) -> Result<Event, SubscriptionError> {
        let mut event = match self.store.get_by_uri(uri).await {
            Ok(event) => event,
            Err(NotifyError::NotFound(_)) => {
                return Err(SubscriptionError::NotFound {
                    operation: Operation::Unsubscribe,
                    uri: uri.clone(),
                    user_id: user_id.clone(),
                });
            }
            Err(source) => {
                return Err(SubscriptionError::Lookup {
                    operation: Operation::Unsubscribe,
                    uri: uri.clone(),
                    user_id: user_id.clone(),
                    source,
                });
            }
        };

        self.store
            .remove_subscriber(uri, user_id)
            .await
            .map_err(|source| match source {
                NotifyError::NotFound(_) => SubscriptionError::NotFound {
                    operation: Operation::Unsubscribe,
                    uri: uri.clone(),
                    user_id: user_id.clone(),
                },
                source => SubscriptionError::Persist {
                    operation: Operation::Unsubscribe,
                    uri: uri.clone(),
                    user_id: user_id.clone(),
                    source,
                },
            })?;
        event.subscribers.remove(user_id);

        let _ = self.event_bus.publish(ClassNotice::Unsubscribed {
            uri: uri.clone(),
            user_id: user_id.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(%uri, %user_id, "user unsubscribed");
        Ok(event)
    }

    /// Lists every class, active or completed, that `user_id` subscribes to.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::Query`] on store failure.
    pub async fn list_subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Event>, SubscriptionError> {
        self.store
            .get_by_subscriber(user_id)
            .await
            .map_err(|source| SubscriptionError::Query {
                operation: Operation::ListSubscriptions,
                user_id: user_id.clone(),
                source,
            })
    }

    /// Returns the stored event for `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] or [`NotifyError::Query`].
    pub async fn get_class(&self, uri: &ClassUri) -> Result<Event, NotifyError> {
        self.store.get_by_uri(uri).await
    }

    /// Deletes the event for `uri`, e.g. to clean up a stale or invalid URI.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] or [`NotifyError::Persist`].
    pub async fn remove_class(&self, uri: &ClassUri) -> Result<(), NotifyError> {
        self.store.remove(uri).await?;
        tracing::info!(%uri, "class removed");
        Ok(())
    }
}
