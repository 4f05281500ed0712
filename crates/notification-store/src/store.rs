use async_trait::async_trait;

use crate::{NotificationId, NotificationQuery, NotificationRecord, NotificationStoreError, Result};

/// Core trait for notification store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Appends a record. Ids are unique; appending an id twice fails with
    /// `Duplicate`.
    async fn append(&self, record: NotificationRecord) -> Result<NotificationId>;

    /// Retrieves a record by id.
    async fn get(&self, id: NotificationId) -> Result<Option<NotificationRecord>>;

    /// Retrieves records matching a query, oldest first.
    async fn query(&self, query: NotificationQuery) -> Result<Vec<NotificationRecord>>;
}

/// Extension trait providing convenience methods for notification stores.
#[async_trait]
pub trait NotificationStoreExt: NotificationStore {
    /// Retrieves a record, failing with `NotFound` if it does not exist.
    async fn get_required(&self, id: NotificationId) -> Result<NotificationRecord> {
        self.get(id)
            .await?
            .ok_or(NotificationStoreError::NotFound(id))
    }

    /// All resends of a record.
    async fn resends(&self, id: NotificationId) -> Result<Vec<NotificationRecord>> {
        self.query(NotificationQuery::resends_of(id)).await
    }
}

impl<T: NotificationStore + ?Sized> NotificationStoreExt for T {}
