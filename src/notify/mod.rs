//! Notifiers: delivery of status-change messages to subscribers.
//!
//! A [`Notifier`] receives the event as it stood before the poll, carrying
//! the freshly captured details, and delivers one message per subscriber.
//! A failure for one subscriber never stops delivery to the rest.

pub mod bus;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ClassStatus, Event};
use crate::error::NotifyError;

pub use bus::BusNotifier;
pub use webhook::WebhookNotifier;

/// Delivers a status change to every subscriber of an event.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Notifies each subscriber of `event` that its status moved from
    /// `previous` to `event.details.status`.
    ///
    /// # Errors
    ///
    /// Returns a single [`NotifyError::Delivery`] summarizing the
    /// subscribers that could not be reached, after trying all of them.
    async fn notify(&self, event: &Event, previous: ClassStatus) -> Result<(), NotifyError>;
}

/// Fans a notification out to several notifiers.
#[derive(Debug, Default)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a notifier to the set.
    #[must_use]
    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Returns the number of notifiers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Returns `true` if the set has no notifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierSet {
    async fn notify(&self, event: &Event, previous: ClassStatus) -> Result<(), NotifyError> {
        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            if let Err(err) = notifier.notify(event, previous).await {
                failures.push(err.to_string());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(failures.join("; ")))
        }
    }
}
