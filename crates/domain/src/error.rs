//! Domain error types.

use common::EntityId;
use thiserror::Error;

/// Errors raised by repositories and the totals calculator.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: EntityId },

    /// The entity exists but a relation required for enrichment is absent.
    #[error("{entity} {id} has no {relation}")]
    MissingRelation {
        entity: &'static str,
        id: EntityId,
        relation: &'static str,
    },

    /// The backing repository failed (network, database, ...).
    #[error("Repository error: {0}")]
    Repository(String),

    /// Scaling an amount left the representable range.
    #[error("Amount {amount} scaled by rate {rate} overflows")]
    AmountOverflow { amount: i64, rate: f64 },

    /// The totals calculator could not compute a total.
    #[error("Totals error: {0}")]
    Totals(String),
}

impl DomainError {
    /// Returns true if this error means the aggregate itself is unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }
}
