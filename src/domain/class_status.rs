//! Enrollment status of a class.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Enrollment status derived from seat and waitlist counts.
///
/// [`ClassStatus::Completed`] is terminal: classes in that state are no
/// longer polled. The remaining variants carry no ordering, only equality
/// matters for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassStatus {
    /// Seats are available.
    Opened,
    /// Seats are taken but the waitlist has room.
    Waitlisted,
    /// Seats and waitlist are both full.
    Full,
    /// The term is over; the URL no longer describes a class in session.
    Completed,
}

impl ClassStatus {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "OPENED",
            Self::Waitlisted => "WAITLISTED",
            Self::Full => "FULL",
            Self::Completed => "COMPLETED",
        }
    }

    /// Returns `true` if the status excludes the class from polling.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassStatus {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPENED" => Ok(Self::Opened),
            "WAITLISTED" => Ok(Self::Waitlisted),
            "FULL" => Ok(Self::Full),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(NotifyError::Parse(format!(
                "unknown class status {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_is_terminal() {
        assert!(ClassStatus::Completed.is_terminal());
        assert!(!ClassStatus::Opened.is_terminal());
        assert!(!ClassStatus::Waitlisted.is_terminal());
        assert!(!ClassStatus::Full.is_terminal());
    }

    #[test]
    fn parses_persisted_form() {
        for status in [
            ClassStatus::Opened,
            ClassStatus::Waitlisted,
            ClassStatus::Full,
            ClassStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ClassStatus>().ok(), Some(status));
        }
        assert!("open".parse::<ClassStatus>().is_err());
    }

    #[test]
    fn serde_uses_upper_case() {
        let json = serde_json::to_string(&ClassStatus::Waitlisted).unwrap_or_default();
        assert_eq!(json, "\"WAITLISTED\"");
    }
}
