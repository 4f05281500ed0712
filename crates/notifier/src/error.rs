//! Notifier error types.

use enrichment::EnrichmentError;
use notification_store::NotificationStoreError;
use thiserror::Error;

/// Errors that can occur while assembling or recording a notification.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Building the template context failed.
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    /// Reading or writing the notification log failed.
    #[error("Notification store error: {0}")]
    Store(#[from] NotificationStoreError),

    /// Fetching the aggregate took longer than the configured limit.
    #[error("Fetching data for '{event}' timed out")]
    FetchTimeout { event: String },

    /// Encoding outcome data failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotifierError {
    /// True when an aggregate or stored record could not be found.
    pub fn is_not_found(&self) -> bool {
        match self {
            NotifierError::Enrichment(err) => err.is_not_found(),
            NotifierError::Store(NotificationStoreError::NotFound(_)) => true,
            _ => false,
        }
    }
}

/// Errors reported by a [`Mailer`](crate::services::Mailer).
#[derive(Debug, Error)]
pub enum MailerError {
    /// The request had no recipient address.
    #[error("No recipient address")]
    MissingRecipient,

    /// The transport rejected the message.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The mailer did not answer within the configured limit.
    #[error("Mailer timed out")]
    Timeout,

    /// The template could not be loaded or rendered.
    #[error("Template error: {0}")]
    Template(String),

    /// A sender or recipient address could not be parsed.
    #[error("Invalid address: {0}")]
    Address(String),

    /// The message could not be built or handed to the transport.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors reported by the optional fulfillment and invoice capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Capability failed: {0}")]
    Failed(String),
}

/// Result type for notifier operations.
pub type Result<T> = std::result::Result<T, NotifierError>;
