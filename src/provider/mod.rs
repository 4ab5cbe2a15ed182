//! Status providers: school-specific adapters from class URI to snapshot.
//!
//! A [`StatusProvider`] knows how to fetch and parse one school's class
//! pages. Providers are registered in a [`ProviderRegistry`] keyed by school
//! id, and the active one is resolved once at startup.

pub mod georgia_tech;
pub(crate) mod html;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ClassDetails, ClassUri};
use crate::error::NotifyError;

pub use georgia_tech::GeorgiaTech;

/// School-specific source of class status snapshots.
///
/// Implementations must be deterministic for the same upstream page.
#[async_trait]
pub trait StatusProvider: Send + Sync + std::fmt::Debug {
    /// Registry key of the school this provider serves.
    fn school(&self) -> &'static str;

    /// Fetches and parses the current status of the class at `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidUri`] for a malformed URI,
    /// [`NotifyError::Fetch`] if the page cannot be retrieved, and
    /// [`NotifyError::Parse`] if it does not have the expected layout.
    async fn fetch_status(&self, uri: &ClassUri) -> Result<ClassDetails, NotifyError>;
}

/// Status providers keyed by school id.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<&'static str, Arc<dyn StatusProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in provider.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Internal`] if a provider cannot be built.
    pub fn with_builtin(fetch_timeout: Duration) -> Result<Self, NotifyError> {
        let mut registry = Self::new();
        registry.register(Arc::new(GeorgiaTech::new(fetch_timeout)?));
        Ok(registry)
    }

    /// Registers `provider` under its school id, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn StatusProvider>) {
        self.providers.insert(provider.school(), provider);
    }

    /// Returns the provider for `school`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::UnknownSchool`] if none is registered.
    pub fn resolve(&self, school: &str) -> Result<Arc<dyn StatusProvider>, NotifyError> {
        self.providers
            .get(school)
            .map(Arc::clone)
            .ok_or_else(|| NotifyError::UnknownSchool(school.to_string()))
    }

    /// Returns the registered school ids in sorted order.
    #[must_use]
    pub fn schools(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }
}
