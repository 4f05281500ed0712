//! HTTP API server with observability for the notification pipeline.
//!
//! Accepts events from the host's bus, sends manual emails and resends
//! stored notifications, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod tasks;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use enrichment::{AggregateSources, EventRouter};
use metrics_exporter_prometheus::PrometheusHandle;
use notification_store::NotificationStore;
use notifier::{
    FulfillmentProvider, Mailer, NotificationAssembler, NotificationSubscriber, NotifierConfig,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;
use tasks::BackgroundTasks;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/smtp/send", post(routes::smtp::send))
        .route("/events/{name}", post(routes::events::ingest))
        .route("/notifications/{id}", get(routes::notifications::get))
        .route(
            "/notifications/{id}/resends",
            get(routes::notifications::resends),
        )
        .route(
            "/notifications/{id}/resend",
            post(routes::notifications::resend),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// The host-facing collaborators the pipeline is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub sources: AggregateSources,
    pub mailer: Arc<dyn Mailer>,
    pub fulfillment: Arc<dyn FulfillmentProvider>,
}

/// Creates application state over `collaborators`, recording notifications
/// in `store`.
pub fn create_state(
    config: NotifierConfig,
    collaborators: Collaborators,
    store: Arc<dyn NotificationStore>,
) -> Arc<AppState> {
    let Collaborators {
        sources,
        mailer,
        fulfillment,
    } = collaborators;

    let assembler =
        NotificationAssembler::new(EventRouter::new(sources), mailer, fulfillment, config);
    let subscriber = NotificationSubscriber::new(assembler.clone(), Arc::clone(&store));

    Arc::new(AppState {
        assembler,
        subscriber,
        store,
        tasks: BackgroundTasks::new(),
    })
}
