//! PostgreSQL read-model integration tests
//!
//! These tests share one PostgreSQL container. Each test works on its own
//! entity ids, so they can run in parallel without truncating tables.

use std::sync::Arc;

use domain::{
    Entity, LineItem, Order, PostgresRepository, PostgresStoreService, Repository,
    RetrieveConfig, Store, StoreService,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

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
            sqlx::raw_sql(include_str!(
                "../../../migrations/002_create_read_models_table.sql"
            ))
            .execute(&temp_pool)
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

async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap()
}

async fn put<T: Entity + Serialize>(pool: &PgPool, entity: &T) {
    sqlx::query(
        r#"
        INSERT INTO read_models (kind, id, document) VALUES ($1, $2, $3)
        ON CONFLICT (kind, id) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
        "#,
    )
    .bind(T::KIND)
    .bind(entity.id().as_str())
    .bind(serde_json::to_value(entity).unwrap())
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn retrieve_reads_document_with_relations() {
    let pool = get_test_pool().await;
    let mut order = Order::new("order_pg_1", "buyer@example.com", "usd");
    order.items = vec![LineItem::new("item_pg_1", "Shirt", 500, 2)];
    order.total = 1000;
    put(&pool, &order).await;

    let repo: PostgresRepository<Order> = PostgresRepository::new(pool);
    let stored = repo
        .retrieve(&"order_pg_1".into(), &RetrieveConfig::new().relations(["items"]))
        .await
        .unwrap();

    assert_eq!(stored, order);
}

#[tokio::test]
async fn retrieve_unknown_is_not_found() {
    let repo: PostgresRepository<Order> = PostgresRepository::new(get_test_pool().await);
    let err = repo
        .retrieve(&"order_pg_missing".into(), &RetrieveConfig::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn kinds_do_not_mix() {
    let pool = get_test_pool().await;
    put(&pool, &LineItem::new("shared_pg_id", "Socks", 300, 1)).await;

    let orders: PostgresRepository<Order> = PostgresRepository::new(pool);
    let err = orders
        .retrieve(&"shared_pg_id".into(), &RetrieveConfig::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_keeps_request_order_and_skips_unknown() {
    let pool = get_test_pool().await;
    put(&pool, &LineItem::new("item_pg_a", "A", 100, 1)).await;
    put(&pool, &LineItem::new("item_pg_b", "B", 200, 1)).await;

    let repo: PostgresRepository<LineItem> = PostgresRepository::new(pool);
    let items = repo
        .list(
            &["item_pg_b".into(), "item_pg_x".into(), "item_pg_a".into()],
            &RetrieveConfig::new(),
        )
        .await
        .unwrap();

    let titles: Vec<_> = items.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, ["B", "A"]);
    assert!(repo.list(&[], &RetrieveConfig::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_document_is_a_repository_error() {
    let pool = get_test_pool().await;
    sqlx::query("INSERT INTO read_models (kind, id, document) VALUES ('order', 'order_pg_bad', $1)")
        .bind(json!({"id": "order_pg_bad", "email": 42}))
        .execute(&pool)
        .await
        .unwrap();

    let repo: PostgresRepository<Order> = PostgresRepository::new(pool);
    let err = repo
        .retrieve(&"order_pg_bad".into(), &RetrieveConfig::new())
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("order_pg_bad"));
}

#[tokio::test]
async fn store_settings_are_read_when_present() {
    let pool = get_test_pool().await;
    let service = PostgresStoreService::new(pool.clone());

    put(
        &pool,
        &Store {
            id: "store".into(),
            name: "Shop".into(),
            swap_link_template: Some("https://shop.example.com/swap/{cart_id}".into()),
        },
    )
    .await;

    let store = service.retrieve().await.unwrap();
    assert_eq!(store.name, "Shop");
    assert!(store.swap_link_template.is_some());
}
