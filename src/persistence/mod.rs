//! Persistence layer: the event store contract and its backends.
//!
//! [`EventStore`] is the only way the rest of the crate touches persisted
//! events. [`MemoryEventStore`] keeps everything in process and is used in
//! development and tests; [`PostgresEventStore`] stores one row per class
//! through a `sqlx::PgPool`.
//!
//! Both backends make single-document subscriber changes atomic: adding or
//! removing a user never races with a concurrent change to the same class.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::mpsc;

use crate::domain::{ClassDetails, ClassUri, Event, UserId};
use crate::error::NotifyError;

pub use memory::MemoryEventStore;
pub use postgres::PostgresEventStore;

/// Lazy, finite, non-restartable stream of active events.
pub type EventStream = BoxStream<'static, Result<Event, NotifyError>>;

/// Durable mapping from class URI to its latest snapshot and subscribers.
///
/// "Active" means any status other than
/// [`crate::domain::ClassStatus::Completed`].
#[async_trait]
pub trait EventStore: Send + Sync + std::fmt::Debug {
    /// Counts active events.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Query`] on store failure.
    async fn count_active(&self) -> Result<usize, NotifyError>;

    /// Streams all active events.
    ///
    /// `capacity_hint` sizes the backend's read-ahead buffer; it is a lower
    /// bound, the stream yields every active event even if more exist.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Query`] if the scan cannot be started.
    async fn stream_active(&self, capacity_hint: usize) -> Result<EventStream, NotifyError>;

    /// Looks up the event for `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] if absent, [`NotifyError::Query`]
    /// on store failure.
    async fn get_by_uri(&self, uri: &ClassUri) -> Result<Event, NotifyError>;

    /// Returns every event, active or completed, that `user_id` subscribes to.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Query`] on store failure.
    async fn get_by_subscriber(&self, user_id: &UserId) -> Result<Vec<Event>, NotifyError>;

    /// Creates an event with a single subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Conflict`] if an event already exists for
    /// `uri`, [`NotifyError::Persist`] on store failure.
    async fn create(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
        first_subscriber: &UserId,
    ) -> Result<Event, NotifyError>;

    /// Adds `user_id` to the subscriber set. Adding an existing member is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] if no event exists,
    /// [`NotifyError::Persist`] on store failure.
    async fn add_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError>;

    /// Removes `user_id` from the subscriber set.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] if no event exists,
    /// [`NotifyError::Persist`] if the user was not subscribed or on store
    /// failure.
    async fn remove_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError>;

    /// Replaces the stored snapshot and records the check time.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] if no event exists,
    /// [`NotifyError::Persist`] on store failure.
    async fn update_details(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
    ) -> Result<(), NotifyError>;

    /// Deletes the event.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotFound`] if no event exists,
    /// [`NotifyError::Persist`] on store failure.
    async fn remove(&self, uri: &ClassUri) -> Result<(), NotifyError>;
}

/// Adapts a channel receiver into an [`EventStream`].
pub(crate) fn receiver_stream(rx: mpsc::Receiver<Result<Event, NotifyError>>) -> EventStream {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}
