//! Return invoice generation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::CapabilityError;

/// Renders a return invoice as a base64-encoded PDF.
#[async_trait]
pub trait InvoiceGenerator: Send + Sync {
    async fn create_return_invoice(
        &self,
        order: &Value,
        items: &Value,
    ) -> Result<String, CapabilityError>;
}

#[derive(Debug, Default)]
struct InMemoryInvoiceState {
    invoice: String,
    calls: Vec<(Value, Value)>,
    fail_on_create: bool,
}

/// In-memory invoice generator for testing; always returns the same body.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceGenerator {
    state: Arc<RwLock<InMemoryInvoiceState>>,
}

impl InMemoryInvoiceGenerator {
    pub fn new(invoice: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryInvoiceState {
                invoice: invoice.into(),
                ..Default::default()
            })),
        }
    }

    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// The `(order, items)` pairs invoices were requested for.
    pub async fn calls(&self) -> Vec<(Value, Value)> {
        self.state.read().await.calls.clone()
    }
}

#[async_trait]
impl InvoiceGenerator for InMemoryInvoiceGenerator {
    async fn create_return_invoice(
        &self,
        order: &Value,
        items: &Value,
    ) -> Result<String, CapabilityError> {
        let mut state = self.state.write().await;
        state.calls.push((order.clone(), items.clone()));

        if state.fail_on_create {
            return Err(CapabilityError::Failed("invoice renderer unavailable".to_string()));
        }
        Ok(state.invoice.clone())
    }
}
