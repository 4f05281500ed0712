use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    NotificationId, NotificationQuery, NotificationRecord, NotificationStoreError, Result,
    store::NotificationStore,
};

/// PostgreSQL-backed notification store.
#[derive(Clone)]
pub struct PostgresNotificationStore {
    pool: PgPool,
}

impl PostgresNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<NotificationRecord> {
        Ok(NotificationRecord {
            id: NotificationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_name: row.try_get("event_name")?,
            to: row.try_get("recipient")?,
            data: row.try_get("data")?,
            parent_id: row
                .try_get::<Option<Uuid>, _>("parent_id")?
                .map(NotificationId::from_uuid),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl NotificationStore for PostgresNotificationStore {
    #[tracing::instrument(skip(self, record), fields(notification_id = %record.id, event = %record.event_name))]
    async fn append(&self, record: NotificationRecord) -> Result<NotificationId> {
        let id = record.id;
        let parent_id = record.parent_id;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, event_name, recipient, data, parent_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&record.event_name)
        .bind(&record.to)
        .bind(&record.data)
        .bind(parent_id.map(|p| p.as_uuid()))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return NotificationStoreError::Duplicate(id);
                }
                if db_err.is_foreign_key_violation()
                    && let Some(parent) = parent_id
                {
                    return NotificationStoreError::ParentNotFound(parent);
                }
            }
            NotificationStoreError::Database(e)
        })?;

        metrics::counter!("notification_store_appends").increment(1);
        Ok(id)
    }

    async fn get(&self, id: NotificationId) -> Result<Option<NotificationRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, event_name, recipient, data, parent_id, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn query(&self, query: NotificationQuery) -> Result<Vec<NotificationRecord>> {
        let mut sql = String::from(
            "SELECT id, event_name, recipient, data, parent_id, created_at FROM notifications WHERE 1=1",
        );
        let mut param_count = 0;

        // Build dynamic query
        if query.event_name.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND event_name = ${param_count}"));
        }
        if query.to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND recipient = ${param_count}"));
        }
        if query.parent_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND parent_id = ${param_count}"));
        }
        if query.from_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.to_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(event_name) = query.event_name {
            sqlx_query = sqlx_query.bind(event_name);
        }
        if let Some(to) = query.to {
            sqlx_query = sqlx_query.bind(to);
        }
        if let Some(parent_id) = query.parent_id {
            sqlx_query = sqlx_query.bind(parent_id.as_uuid());
        }
        if let Some(from_ts) = query.from_timestamp {
            sqlx_query = sqlx_query.bind(from_ts);
        }
        if let Some(to_ts) = query.to_timestamp {
            sqlx_query = sqlx_query.bind(to_ts);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }
}
