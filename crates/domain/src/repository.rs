//! Read-only collaborator traits through which aggregates are fetched.

use async_trait::async_trait;
use common::EntityId;

use crate::error::DomainError;
use crate::models::Store;

/// Which fields and relations a caller needs loaded.
///
/// Repositories may load more than requested but must load at least the
/// listed relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieveConfig {
    pub select: Vec<&'static str>,
    pub relations: Vec<&'static str>,
}

impl RetrieveConfig {
    /// Creates an empty config (default fields, no relations).
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests specific fields.
    pub fn select(mut self, fields: impl IntoIterator<Item = &'static str>) -> Self {
        self.select.extend(fields);
        self
    }

    /// Requests relations to be loaded.
    pub fn relations(mut self, relations: impl IntoIterator<Item = &'static str>) -> Self {
        self.relations.extend(relations);
        self
    }

    /// Returns true if the relation was requested.
    pub fn has_relation(&self, relation: &str) -> bool {
        self.relations.iter().any(|r| *r == relation)
    }
}

/// Repository for one aggregate kind.
///
/// Implementations must be thread-safe; the pipeline issues concurrent
/// lookups from independent notifications.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Retrieves one entity. Fails with [`DomainError::NotFound`] for unknown ids.
    async fn retrieve(&self, id: &EntityId, config: &RetrieveConfig) -> Result<T, DomainError>;

    /// Lists the entities with the given ids. Unknown ids are skipped.
    async fn list(&self, ids: &[EntityId], config: &RetrieveConfig)
    -> Result<Vec<T>, DomainError>;
}

/// Access to the single store settings record.
#[async_trait]
pub trait StoreService: Send + Sync {
    async fn retrieve(&self) -> Result<Store, DomainError>;
}
