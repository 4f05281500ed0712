//! Manual email sending.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use notifier::{NotificationOutcome, SendEmailOptions};

use super::AppState;
use crate::error::ApiError;

/// `POST /smtp/send`: render and send a template to one address.
///
/// Delivery failures are reported in the outcome status, not as errors.
#[tracing::instrument(skip(state, options), fields(template = %options.template_name))]
pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(options): Json<SendEmailOptions>,
) -> Result<Json<NotificationOutcome>, ApiError> {
    if options.template_name.is_empty() {
        return Err(ApiError::BadRequest("templateName is required".to_string()));
    }
    if options.to.is_empty() {
        return Err(ApiError::BadRequest("to is required".to_string()));
    }

    let outcome = state.assembler.send_email(options).await?;
    Ok(Json(outcome))
}
