//! Aggregates read from JSON documents in PostgreSQL.
//!
//! The host keeps one row per entity in `read_models`, keyed by
//! `(kind, id)` where `kind` is [`Entity::KIND`]. Documents carry their
//! relations already embedded, so the [`RetrieveConfig`] is not consulted.

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use common::EntityId;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;

use crate::error::DomainError;
use crate::models::{Entity, Store};
use crate::repository::{Repository, RetrieveConfig, StoreService};

/// Repository over the `read_models` rows of one entity kind.
pub struct PostgresRepository<T> {
    pool: PgPool,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for PostgresRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> PostgresRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }
}

fn database_error(kind: &str, err: sqlx::Error) -> DomainError {
    DomainError::Repository(format!("{kind} read model: {err}"))
}

fn decode<T: Entity + DeserializeOwned>(id: &str, document: Value) -> Result<T, DomainError> {
    serde_json::from_value(document)
        .map_err(|err| DomainError::Repository(format!("{} {id} is malformed: {err}", T::KIND)))
}

#[async_trait]
impl<T: Entity + DeserializeOwned + Send + Sync> Repository<T> for PostgresRepository<T> {
    #[tracing::instrument(skip(self, _config), fields(kind = T::KIND))]
    async fn retrieve(&self, id: &EntityId, _config: &RetrieveConfig) -> Result<T, DomainError> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT document FROM read_models WHERE kind = $1 AND id = $2")
                .bind(T::KIND)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| database_error(T::KIND, err))?;

        let (document,) = row.ok_or_else(|| DomainError::NotFound {
            entity: T::KIND,
            id: id.clone(),
        })?;
        decode(id.as_str(), document)
    }

    async fn list(
        &self,
        ids: &[EntityId],
        _config: &RetrieveConfig,
    ) -> Result<Vec<T>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT id, document FROM read_models WHERE kind = $1 AND id = ANY($2)")
                .bind(T::KIND)
                .bind(&keys)
                .fetch_all(&self.pool)
                .await
                .map_err(|err| database_error(T::KIND, err))?;

        // Results follow the order of `ids`.
        let mut documents: HashMap<String, Value> = rows.into_iter().collect();
        keys.iter()
            .filter_map(|key| documents.remove(key).map(|document| decode(key, document)))
            .collect()
    }
}

/// Store settings from the single `store` read model.
///
/// A missing row yields default settings.
#[derive(Clone)]
pub struct PostgresStoreService {
    pool: PgPool,
}

impl PostgresStoreService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreService for PostgresStoreService {
    async fn retrieve(&self) -> Result<Store, DomainError> {
        let row: Option<(String, Value)> = sqlx::query_as(
            "SELECT id, document FROM read_models WHERE kind = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(Store::KIND)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| database_error(Store::KIND, err))?;

        match row {
            Some((id, document)) => decode(&id, document),
            None => {
                tracing::debug!("No store read model, using defaults");
                Ok(Store::default())
            }
        }
    }
}
