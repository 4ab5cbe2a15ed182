//! Notifier that posts a JSON message per subscriber to a webhook URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

use super::Notifier;
use crate::domain::{ClassStatus, ClassUri, Event, UserId};
use crate::error::NotifyError;

/// Body posted to the webhook for each subscriber.
#[derive(Debug, Serialize)]
pub struct WebhookMessage<'a> {
    /// Chat-style message text.
    pub content: String,
    /// Recipient.
    pub user_id: &'a UserId,
    /// Class URI.
    pub uri: &'a ClassUri,
    /// Class title.
    pub class_name: &'a str,
    /// Status before the poll.
    pub previous_status: ClassStatus,
    /// Status after the poll.
    pub status: ClassStatus,
}

/// Posts status changes to an external webhook (chat bridge, mailer, ...).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidRequest`] if `url` does not parse and
    /// [`NotifyError::Internal`] if the HTTP client cannot be built.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let url = Url::parse(url)
            .map_err(|e| NotifyError::InvalidRequest(format!("webhook url {url:?}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Internal(format!("building http client: {e}")))?;
        Ok(Self { client, url })
    }

    async fn deliver(&self, message: &WebhookMessage<'_>) -> Result<(), reqwest::Error> {
        self.client
            .post(self.url.clone())
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &Event, previous: ClassStatus) -> Result<(), NotifyError> {
        let mut failed = Vec::new();
        for user_id in &event.subscribers {
            let message = WebhookMessage {
                content: format!("CLASS STATUS HAS CHANGED TO {}", event.details.status),
                user_id,
                uri: &event.uri,
                class_name: &event.details.name,
                previous_status: previous,
                status: event.details.status,
            };
            if let Err(err) = self.deliver(&message).await {
                tracing::warn!(uri = %event.uri, %user_id, error = %err, "webhook delivery failed");
                failed.push(user_id.to_string());
            }
        }
        if failed.is_empty() {
            return Ok(());
        }
        Err(NotifyError::Delivery(format!(
            "could not notify {} of {} subscribers of {}: {}",
            failed.len(),
            event.subscribers.len(),
            event.uri,
            failed.join(", ")
        )))
    }
}
