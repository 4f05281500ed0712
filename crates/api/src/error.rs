//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use enrichment::EnrichmentError;
use notification_store::NotificationStoreError;
use notifier::NotifierError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Assembling, sending or recording a notification failed.
    Notifier(NotifierError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Notifier(err) => notifier_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn notifier_error_to_response(err: NotifierError) -> (StatusCode, String) {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, err.to_string());
    }
    match &err {
        NotifierError::Enrichment(EnrichmentError::InvalidPayload { .. }) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        NotifierError::FetchTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, err.to_string()),
        _ => {
            tracing::error!(error = %err, "notifier error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<NotifierError> for ApiError {
    fn from(err: NotifierError) -> Self {
        ApiError::Notifier(err)
    }
}

impl From<NotificationStoreError> for ApiError {
    fn from(err: NotificationStoreError) -> Self {
        ApiError::Notifier(NotifierError::Store(err))
    }
}
