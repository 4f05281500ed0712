//! Event ingress from the host's event bus.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use super::AppState;

#[derive(Serialize)]
pub struct EventAcceptedResponse {
    pub event: String,
    pub status: &'static str,
}

/// `POST /events/:name`: hand an event to the subscriber in the background.
/// The task is tracked so shutdown can wait for it.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<EventAcceptedResponse>) {
    tracing::info!(event = %name, "event received");
    metrics::counter!("notification_events_received_total").increment(1);

    let subscriber = state.subscriber.clone();
    let event = name.clone();
    state.tasks.spawn(async move {
        subscriber.handle(&event, payload).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(EventAcceptedResponse {
            event: name,
            status: "accepted",
        }),
    )
}
