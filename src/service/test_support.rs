//! Scripted collaborators shared by the service unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use futures_util::StreamExt;

use crate::domain::{ClassDetails, ClassStatus, ClassUri, Event, UserId};
use crate::error::NotifyError;
use crate::notify::Notifier;
use crate::persistence::{EventStore, EventStream, MemoryEventStore};
use crate::provider::StatusProvider;

/// Provider returning whatever details were scripted for a URI.
#[derive(Debug, Default)]
pub(crate) struct ScriptedProvider {
    pages: Mutex<HashMap<ClassUri, ClassDetails>>,
    calls: Mutex<HashMap<ClassUri, usize>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn set(&self, uri: &ClassUri, details: ClassDetails) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(uri.clone(), details);
        }
    }

    pub(crate) fn calls(&self, uri: &ClassUri) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(uri).copied().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StatusProvider for ScriptedProvider {
    fn school(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_status(&self, uri: &ClassUri) -> Result<ClassDetails, NotifyError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(uri.clone()).or_default() += 1;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .lock()
            .ok()
            .and_then(|pages| pages.get(uri).cloned())
            .ok_or_else(|| NotifyError::Fetch(format!("no page scripted for {uri}")))
    }
}

/// One recorded notifier call.
#[derive(Debug, Clone)]
pub(crate) struct Delivered {
    pub(crate) event: Event,
    pub(crate) previous: ClassStatus,
}

/// Notifier that records every call and optionally fails.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    delivered: Mutex<Vec<Delivered>>,
    fail: bool,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn delivered(&self) -> Vec<Delivered> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &Event, previous: ClassStatus) -> Result<(), NotifyError> {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(Delivered {
                event: event.clone(),
                previous,
            });
        }
        if self.fail {
            return Err(NotifyError::Delivery("recipient unreachable".to_string()));
        }
        Ok(())
    }
}

/// Store that delegates to a [`MemoryEventStore`] but can hang its scan or
/// hold back the reply of a snapshot update.
#[derive(Debug, Default)]
pub(crate) struct StallingStore {
    pub(crate) inner: MemoryEventStore,
    stall_scan: bool,
    slow_update: Option<Duration>,
}

impl StallingStore {
    /// Reports one active event but never yields it.
    pub(crate) fn stalled_scan() -> Self {
        Self {
            stall_scan: true,
            ..Self::default()
        }
    }

    /// Applies each update, then sleeps for `delay` before replying.
    pub(crate) fn slow_update(delay: Duration) -> Self {
        Self {
            slow_update: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl EventStore for StallingStore {
    async fn count_active(&self) -> Result<usize, NotifyError> {
        if self.stall_scan {
            return Ok(1);
        }
        self.inner.count_active().await
    }

    async fn stream_active(&self, capacity_hint: usize) -> Result<EventStream, NotifyError> {
        if self.stall_scan {
            return Ok(futures_util::stream::pending().boxed());
        }
        self.inner.stream_active(capacity_hint).await
    }

    async fn get_by_uri(&self, uri: &ClassUri) -> Result<Event, NotifyError> {
        self.inner.get_by_uri(uri).await
    }

    async fn get_by_subscriber(&self, user_id: &UserId) -> Result<Vec<Event>, NotifyError> {
        self.inner.get_by_subscriber(user_id).await
    }

    async fn create(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
        first_subscriber: &UserId,
    ) -> Result<Event, NotifyError> {
        self.inner.create(uri, details, first_subscriber).await
    }

    async fn add_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError> {
        self.inner.add_subscriber(uri, user_id).await
    }

    async fn remove_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError> {
        self.inner.remove_subscriber(uri, user_id).await
    }

    async fn update_details(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
    ) -> Result<(), NotifyError> {
        self.inner.update_details(uri, details).await?;
        if let Some(delay) = self.slow_update {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn remove(&self, uri: &ClassUri) -> Result<(), NotifyError> {
        self.inner.remove(uri).await
    }
}
