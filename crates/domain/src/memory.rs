//! In-memory repositories for tests and local wiring.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::EntityId;
use tokio::sync::RwLock;

use crate::error::DomainError;
use crate::models::{Entity, Store};
use crate::repository::{Repository, RetrieveConfig, StoreService};

struct InMemoryRepositoryState<T> {
    entities: HashMap<EntityId, T>,
    requests: Vec<RetrieveConfig>,
    unavailable: bool,
}

impl<T> Default for InMemoryRepositoryState<T> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            requests: Vec::new(),
            unavailable: false,
        }
    }
}

/// In-memory repository keyed by entity id.
///
/// Records every request so tests can assert which relations were asked for,
/// or that no fetch happened at all.
pub struct InMemoryRepository<T> {
    state: Arc<RwLock<InMemoryRepositoryState<T>>>,
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryRepositoryState::default())),
        }
    }
}

impl<T: Entity + Clone + Send + Sync> InMemoryRepository<T> {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with entities.
    pub fn from_entities(entities: impl IntoIterator<Item = T>) -> Self {
        let state = InMemoryRepositoryState {
            entities: entities
                .into_iter()
                .map(|e| (e.id().clone(), e))
                .collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Inserts or replaces an entity.
    pub async fn insert(&self, entity: T) {
        let mut state = self.state.write().await;
        state.entities.insert(entity.id().clone(), entity);
    }

    /// Makes every subsequent call fail with a repository error.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Number of retrieve/list calls served so far.
    pub async fn request_count(&self) -> usize {
        self.state.read().await.requests.len()
    }

    /// The configs passed to each retrieve/list call, in order.
    pub async fn requests(&self) -> Vec<RetrieveConfig> {
        self.state.read().await.requests.clone()
    }
}

#[async_trait]
impl<T: Entity + Clone + Send + Sync> Repository<T> for InMemoryRepository<T> {
    async fn retrieve(&self, id: &EntityId, config: &RetrieveConfig) -> Result<T, DomainError> {
        let mut state = self.state.write().await;
        state.requests.push(config.clone());

        if state.unavailable {
            return Err(DomainError::Repository(format!("{} repository unavailable", T::KIND)));
        }

        state
            .entities
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound {
                entity: T::KIND,
                id: id.clone(),
            })
    }

    async fn list(
        &self,
        ids: &[EntityId],
        config: &RetrieveConfig,
    ) -> Result<Vec<T>, DomainError> {
        let mut state = self.state.write().await;
        state.requests.push(config.clone());

        if state.unavailable {
            return Err(DomainError::Repository(format!("{} repository unavailable", T::KIND)));
        }

        Ok(ids
            .iter()
            .filter_map(|id| state.entities.get(id).cloned())
            .collect())
    }
}

/// Store settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreService {
    store: Arc<RwLock<Store>>,
}

impl InMemoryStoreService {
    /// Creates a service returning the given store.
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Replaces the store settings.
    pub async fn set(&self, store: Store) {
        *self.store.write().await = store;
    }
}

#[async_trait]
impl StoreService for InMemoryStoreService {
    async fn retrieve(&self) -> Result<Store, DomainError> {
        Ok(self.store.read().await.clone())
    }
}
