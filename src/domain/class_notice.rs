//! Notices addressed to individual subscribers.
//!
//! Every subscription change and every detected status transition produces
//! a [`ClassNotice`] on the [`super::EventBus`]. WebSocket sessions forward
//! the notices addressed to their user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ClassDetails, ClassStatus, ClassUri, UserId};

/// Notice published for one user about one class.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ClassNotice {
    /// The class status differs from the previously stored one.
    StatusChanged {
        /// Class URI.
        uri: ClassUri,
        /// Recipient.
        user_id: UserId,
        /// Status before the poll.
        previous_status: ClassStatus,
        /// Snapshot captured by the poll.
        details: ClassDetails,
        /// Detection timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The user was added to the class's subscriber set.
    Subscribed {
        /// Class URI.
        uri: ClassUri,
        /// Subscriber.
        user_id: UserId,
        /// Class name at subscription time.
        class_name: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The user was removed from the class's subscriber set.
    Unsubscribed {
        /// Class URI.
        uri: ClassUri,
        /// Former subscriber.
        user_id: UserId,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl ClassNotice {
    /// Returns the user this notice is addressed to.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::StatusChanged { user_id, .. }
            | Self::Subscribed { user_id, .. }
            | Self::Unsubscribed { user_id, .. } => user_id,
        }
    }

    /// Returns the class URI this notice is about.
    #[must_use]
    pub fn uri(&self) -> &ClassUri {
        match self {
            Self::StatusChanged { uri, .. }
            | Self::Subscribed { uri, .. }
            | Self::Unsubscribed { uri, .. } => uri,
        }
    }

    /// Returns the notice type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
        }
    }

    /// Short human-readable headline, as shown in a chat message title.
    #[must_use]
    pub fn headline(&self) -> String {
        match self {
            Self::StatusChanged { details, .. } => {
                format!("CLASS STATUS HAS CHANGED TO {}", details.status)
            }
            Self::Subscribed { class_name, .. } => format!("Added you to class {class_name}"),
            Self::Unsubscribed { uri, .. } => format!("Unsubscribed from class {uri}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SeatCounts;

    fn ids() -> (ClassUri, UserId) {
        let (Ok(uri), Ok(user)) = (ClassUri::parse("https://x.edu/9"), UserId::parse("bob")) else {
            panic!("valid identifiers");
        };
        (uri, user)
    }

    #[test]
    fn status_changed_serializes_with_tag() {
        let (uri, user_id) = ids();
        let notice = ClassNotice::StatusChanged {
            uri,
            user_id,
            previous_status: ClassStatus::Opened,
            details: ClassDetails::from_counts(
                "Physics I",
                SeatCounts::new(30, 30),
                SeatCounts::new(0, 0),
            ),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&notice).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"status_changed\""));
        assert!(json.contains("\"previous_status\":\"OPENED\""));
        assert!(json.contains("\"status\":\"FULL\""));
        assert_eq!(notice.headline(), "CLASS STATUS HAS CHANGED TO FULL");
    }

    #[test]
    fn accessors_return_addressee() {
        let (uri, user_id) = ids();
        let notice = ClassNotice::Unsubscribed {
            uri: uri.clone(),
            user_id: user_id.clone(),
            timestamp: Utc::now(),
        };
        assert_eq!(notice.user_id(), &user_id);
        assert_eq!(notice.uri(), &uri);
        assert_eq!(notice.event_type_str(), "unsubscribed");
    }
}
