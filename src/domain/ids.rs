//! Type-safe identifiers for monitored classes and subscribers.
//!
//! [`ClassUri`] and [`UserId`] are string newtypes so a class URL can never
//! be passed where a subscriber identity is expected, and vice versa.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// URI of a class page; the primary key of an [`super::Event`].
///
/// Surrounding whitespace is trimmed on parse so that the same page pasted
/// twice with stray spaces maps to the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassUri(String);

impl ClassUri {
    /// Parses a class URI, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidUri`] if the value is empty.
    pub fn parse(raw: &str) -> Result<Self, NotifyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NotifyError::InvalidUri("class uri is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClassUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClassUri {
    type Error = NotifyError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ClassUri> for String {
    fn from(value: ClassUri) -> Self {
        value.0
    }
}

/// Identity of a subscriber (chat user id, account name, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parses a user id, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidRequest`] if the value is empty.
    pub fn parse(raw: &str) -> Result<Self, NotifyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NotifyError::InvalidRequest("user id is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = NotifyError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}
