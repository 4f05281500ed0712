//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container. Each test works on its own
//! event names and recipients, so they can run in parallel without
//! truncating tables.

use std::sync::Arc;

use chrono::{Duration, SubsecRound, Utc};
use notification_store::{
    NotificationId, NotificationQuery, NotificationRecord, NotificationStore,
    NotificationStoreError, NotificationStoreExt, PostgresNotificationStore,
};
use serde_json::json;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresNotificationStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresNotificationStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    PostgresNotificationStore::new(pool)
}

/// An event name no other test uses.
fn unique_event() -> String {
    format!("test.{}", Uuid::new_v4().simple())
}

fn record(event: &str, to: &str) -> NotificationRecord {
    // Postgres keeps microseconds
    NotificationRecord::new(event, Some(to.to_string()), json!({"email": to, "total": "1.00 USD"}))
        .created_at(Utc::now().trunc_subsecs(6))
}

#[tokio::test]
async fn append_and_get() {
    let store = get_test_store().await;
    let rec = record(&unique_event(), "a@example.com");

    let id = store.append(rec.clone()).await.unwrap();
    let stored = store.get(id).await.unwrap();

    assert_eq!(stored, Some(rec));
}

#[tokio::test]
async fn get_unknown_is_none() {
    let store = get_test_store().await;
    assert_eq!(store.get(NotificationId::new()).await.unwrap(), None);

    let result = store.get_required(NotificationId::new()).await;
    assert!(matches!(result, Err(NotificationStoreError::NotFound(_))));
}

#[tokio::test]
async fn duplicate_append_is_rejected() {
    let store = get_test_store().await;
    let rec = record(&unique_event(), "a@example.com");
    store.append(rec.clone()).await.unwrap();

    let result = store.append(rec).await;
    assert!(matches!(result, Err(NotificationStoreError::Duplicate(_))));
}

#[tokio::test]
async fn resend_with_unknown_parent_is_rejected() {
    let store = get_test_store().await;
    let orphan = record(&unique_event(), "a@example.com").resend_of(NotificationId::new());

    let result = store.append(orphan).await;
    assert!(matches!(
        result,
        Err(NotificationStoreError::ParentNotFound(_))
    ));
}

#[tokio::test]
async fn resends_are_queryable() {
    let store = get_test_store().await;
    let event = unique_event();
    let original = store.append(record(&event, "a@example.com")).await.unwrap();
    store
        .append(record(&event, "b@example.com").resend_of(original))
        .await
        .unwrap();

    let resends = store.resends(original).await.unwrap();
    assert_eq!(resends.len(), 1);
    assert_eq!(resends[0].to.as_deref(), Some("b@example.com"));
    assert_eq!(resends[0].parent_id, Some(original));
}

#[tokio::test]
async fn query_filters_and_pages() {
    let store = get_test_store().await;
    let event = unique_event();
    let now = Utc::now().trunc_subsecs(6);

    for i in 0..4 {
        store
            .append(record(&event, "a@example.com").created_at(now + Duration::seconds(i)))
            .await
            .unwrap();
    }
    store
        .append(record(&event, "z@example.com").created_at(now + Duration::seconds(10)))
        .await
        .unwrap();

    let all = store
        .query(NotificationQuery::for_event(&event))
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));

    let page = store
        .query(NotificationQuery::for_event(&event).offset(1).limit(2))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].created_at, now + Duration::seconds(1));

    let to_z = store
        .query(NotificationQuery::for_event(&event).to("z@example.com"))
        .await
        .unwrap();
    assert_eq!(to_z.len(), 1);

    let window = store
        .query(
            NotificationQuery::for_event(&event)
                .from_timestamp(now + Duration::seconds(1))
                .to_timestamp(now + Duration::seconds(2)),
        )
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
}

#[tokio::test]
async fn record_without_recipient() {
    let store = get_test_store().await;
    let rec = NotificationRecord::new(unique_event(), None, json!({}))
        .created_at(Utc::now().trunc_subsecs(6));

    let id = store.append(rec).await.unwrap();
    let stored = store.get_required(id).await.unwrap();
    assert_eq!(stored.to, None);
}
