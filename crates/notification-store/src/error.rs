use thiserror::Error;

use crate::NotificationId;

/// Errors that can occur when interacting with the notification store.
#[derive(Debug, Error)]
pub enum NotificationStoreError {
    /// No record with this id exists.
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),

    /// A record with this id was already appended.
    #[error("Notification already stored: {0}")]
    Duplicate(NotificationId),

    /// The parent of a resend record does not exist.
    #[error("Parent notification not found: {0}")]
    ParentNotFound(NotificationId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for notification store operations.
pub type Result<T> = std::result::Result<T, NotificationStoreError>;
