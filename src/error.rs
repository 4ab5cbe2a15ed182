//! Error types with HTTP status code mapping.
//!
//! [`NotifyError`] is the central error type shared by the store, the status
//! providers, the notifiers, and the monitor. [`SubscriptionError`] wraps it
//! with the context of a user-facing subscription operation so the failure
//! can be logged in full while the caller only sees a generic message.

use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{ClassUri, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "no class is monitored at https://...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn into_response_with(status: StatusCode, code: u32, message: String) -> Response {
        let body = Self {
            error: ErrorBody {
                code,
                message,
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

/// Crate-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                  |
/// |-----------|----------------------|------------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request              |
/// | 2000–2999 | State/Not Found      | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Store / Server       | 500 / 504                    |
/// | 4000–4999 | Upstream (school, delivery) | 502 Bad Gateway       |
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// No event exists for the given class URI.
    #[error("no class is monitored at {0}")]
    NotFound(ClassUri),

    /// An event already exists for the given class URI.
    #[error("class {0} is already monitored")]
    Conflict(ClassUri),

    /// A store read failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A store write failed or modified nothing.
    #[error("persist failed: {0}")]
    Persist(String),

    /// An outbound call did not finish in time.
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// Timeout that was exceeded.
        limit: Duration,
    },

    /// The class URI is malformed or not served by the provider.
    #[error("invalid class uri: {0}")]
    InvalidUri(String),

    /// The class page could not be retrieved.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The class page did not have the expected layout.
    #[error("parse failed: {0}")]
    Parse(String),

    /// One or more subscribers could not be notified.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// No status provider is registered under the given school id.
    #[error("unknown school: {0}")]
    UnknownSchool(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NotifyError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1000,
            Self::InvalidUri(_) => 1001,
            Self::UnknownSchool(_) => 1002,
            Self::NotFound(_) => 2001,
            Self::Conflict(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Query(_) => 3001,
            Self::Persist(_) => 3002,
            Self::Timeout { .. } => 3003,
            Self::Fetch(_) => 4001,
            Self::Parse(_) => 4002,
            Self::Delivery(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidUri(_) | Self::UnknownSchool(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Query(_) | Self::Persist(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Fetch(_) | Self::Parse(_) | Self::Delivery(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        ErrorResponse::into_response_with(self.status_code(), self.error_code(), self.to_string())
    }
}

/// User-facing subscription operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Add a user to a class's subscriber set.
    Subscribe,
    /// Remove a user from a class's subscriber set.
    Unsubscribe,
    /// List the classes a user is subscribed to.
    ListSubscriptions,
}

impl Operation {
    /// Generic message shown to the end user when the operation fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Subscribe => "unable to add you to class",
            Self::Unsubscribe => "unable to unsubscribe you from class",
            Self::ListSubscriptions => "unable to list your classes",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::ListSubscriptions => "list subscriptions",
        };
        f.write_str(name)
    }
}

/// Failure of a subscription operation, carrying operation, URI, and user.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// The store failed for a reason other than not-found.
    #[error("{operation}: looking up {uri} for {user_id}: {source}")]
    Lookup {
        /// Failed operation.
        operation: Operation,
        /// Class URI involved.
        uri: ClassUri,
        /// User involved.
        user_id: UserId,
        /// Underlying error.
        #[source]
        source: NotifyError,
    },

    /// The first status fetch of a new class failed.
    #[error("{operation}: fetching status of {uri} for {user_id}: {source}")]
    Fetch {
        /// Failed operation.
        operation: Operation,
        /// Class URI involved.
        uri: ClassUri,
        /// User involved.
        user_id: UserId,
        /// Underlying error.
        #[source]
        source: NotifyError,
    },

    /// The store could not create the event or change its subscriber set.
    #[error("{operation}: persisting {uri} for {user_id}: {source}")]
    Persist {
        /// Failed operation.
        operation: Operation,
        /// Class URI involved.
        uri: ClassUri,
        /// User involved.
        user_id: UserId,
        /// Underlying error.
        #[source]
        source: NotifyError,
    },

    /// No event exists for the URI.
    #[error("{operation}: no class is monitored at {uri} (user {user_id})")]
    NotFound {
        /// Failed operation.
        operation: Operation,
        /// Class URI involved.
        uri: ClassUri,
        /// User involved.
        user_id: UserId,
    },

    /// Listing the user's events failed.
    #[error("{operation}: querying classes of {user_id}: {source}")]
    Query {
        /// Failed operation.
        operation: Operation,
        /// User involved.
        user_id: UserId,
        /// Underlying error.
        #[source]
        source: NotifyError,
    },
}

impl SubscriptionError {
    /// Returns the operation that failed.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Lookup { operation, .. }
            | Self::Fetch { operation, .. }
            | Self::Persist { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Query { operation, .. } => *operation,
        }
    }

    /// Generic message safe to show to the end user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        self.operation().failure_message()
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::NotFound { .. } => 2001,
            Self::Lookup { .. } | Self::Query { .. } => 3001,
            Self::Persist { .. } => 3002,
            Self::Fetch { .. } => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Fetch { .. } => StatusCode::BAD_GATEWAY,
            Self::Lookup { .. } | Self::Persist { .. } | Self::Query { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "subscription request failed");
        ErrorResponse::into_response_with(
            self.status_code(),
            self.error_code(),
            self.user_message().to_string(),
        )
    }
}
