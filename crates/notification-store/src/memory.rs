use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    NotificationId, NotificationQuery, NotificationRecord, NotificationStoreError, Result,
    store::NotificationStore,
};

/// In-memory notification store for tests and local wiring.
///
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryNotificationStore {
    records: Arc<RwLock<Vec<NotificationRecord>>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns every record in insertion order.
    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.records.read().await.clone()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn record_matches(record: &NotificationRecord, query: &NotificationQuery) -> bool {
    if let Some(ref name) = query.event_name
        && &record.event_name != name
    {
        return false;
    }
    if let Some(ref to) = query.to
        && record.to.as_ref() != Some(to)
    {
        return false;
    }
    if let Some(parent) = query.parent_id
        && record.parent_id != Some(parent)
    {
        return false;
    }
    if let Some(from) = query.from_timestamp
        && record.created_at < from
    {
        return false;
    }
    if let Some(to) = query.to_timestamp
        && record.created_at > to
    {
        return false;
    }
    true
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(&self, record: NotificationRecord) -> Result<NotificationId> {
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.id == record.id) {
            return Err(NotificationStoreError::Duplicate(record.id));
        }
        if let Some(parent) = record.parent_id
            && !records.iter().any(|r| r.id == parent)
        {
            return Err(NotificationStoreError::ParentNotFound(parent));
        }

        let id = record.id;
        records.push(record);
        metrics::counter!("notification_store_appends").increment(1);
        Ok(id)
    }

    async fn get(&self, id: NotificationId) -> Result<Option<NotificationRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn query(&self, query: NotificationQuery) -> Result<Vec<NotificationRecord>> {
        let records = self.records.read().await;
        let mut found: Vec<_> = records
            .iter()
            .filter(|r| record_matches(r, &query))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps
        found.sort_by_key(|r| r.created_at);

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }
}
