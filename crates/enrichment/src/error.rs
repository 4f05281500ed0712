//! Enrichment error types.

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur while building a template context.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// An aggregate could not be loaded or totalled.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The event payload does not match the event's payload shape.
    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        source: serde_json::Error,
    },

    /// A context field could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value spread into a context did not serialize to a JSON object.
    #[error("Cannot spread non-object value into context field set: {0}")]
    NotAnObject(&'static str),
}

impl EnrichmentError {
    /// Returns true if the referenced aggregate does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EnrichmentError::Domain(e) if e.is_not_found())
    }
}

/// Result type for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichmentError>;
