//! Stored notifications and resends.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use notification_store::{NotificationId, NotificationRecord, NotificationStoreExt};
use notifier::{NotificationOutcome, ResendOverrides};

use super::AppState;
use crate::error::ApiError;

/// `GET /notifications/:id`: load a stored notification.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NotificationRecord>, ApiError> {
    let id = parse_notification_id(&id)?;
    let record = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Notification {id} not found")))?;
    Ok(Json(record))
}

/// `GET /notifications/:id/resends`: every resend of a notification.
#[tracing::instrument(skip(state))]
pub async fn resends(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NotificationRecord>>, ApiError> {
    let id = parse_notification_id(&id)?;
    state.store.get_required(id).await?;
    Ok(Json(state.store.resends(id).await?))
}

/// `POST /notifications/:id/resend`: send a stored notification again.
#[tracing::instrument(skip(state, overrides))]
pub async fn resend(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(overrides): Json<ResendOverrides>,
) -> Result<Json<NotificationOutcome>, ApiError> {
    let id = parse_notification_id(&id)?;
    let outcome = state.subscriber.resend(id, overrides).await?;
    Ok(Json(outcome))
}

fn parse_notification_id(id: &str) -> Result<NotificationId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
