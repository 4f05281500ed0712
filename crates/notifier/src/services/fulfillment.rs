//! Fulfillment provider documents (return labels).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::CapabilityError;

/// The kind of document requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Label,
    Invoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "base_64")]
    pub base64: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Produces shipping documents for a provider's shipments.
#[async_trait]
pub trait FulfillmentProvider: Send + Sync {
    async fn retrieve_documents(
        &self,
        provider_id: &str,
        shipping_data: &Value,
        kind: DocumentKind,
    ) -> Result<Vec<Document>, CapabilityError>;
}

#[derive(Debug, Default)]
struct InMemoryFulfillmentState {
    documents: HashMap<(String, DocumentKind), Vec<Document>>,
    requests: Vec<(String, Value, DocumentKind)>,
    fail_on_retrieve: bool,
}

/// In-memory fulfillment provider for testing.
///
/// Providers without registered documents are unknown.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFulfillmentProvider {
    state: Arc<RwLock<InMemoryFulfillmentState>>,
}

impl InMemoryFulfillmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the documents `provider_id` returns for `kind`.
    pub async fn set_documents(
        &self,
        provider_id: impl Into<String>,
        kind: DocumentKind,
        documents: Vec<Document>,
    ) {
        self.state
            .write()
            .await
            .documents
            .insert((provider_id.into(), kind), documents);
    }

    pub async fn set_fail_on_retrieve(&self, fail: bool) {
        self.state.write().await.fail_on_retrieve = fail;
    }

    /// Every `(provider_id, shipping_data, kind)` asked for, in order.
    pub async fn requests(&self) -> Vec<(String, Value, DocumentKind)> {
        self.state.read().await.requests.clone()
    }
}

#[async_trait]
impl FulfillmentProvider for InMemoryFulfillmentProvider {
    async fn retrieve_documents(
        &self,
        provider_id: &str,
        shipping_data: &Value,
        kind: DocumentKind,
    ) -> Result<Vec<Document>, CapabilityError> {
        let mut state = self.state.write().await;
        state
            .requests
            .push((provider_id.to_string(), shipping_data.clone(), kind));

        if state.fail_on_retrieve {
            return Err(CapabilityError::Failed(format!(
                "{provider_id} could not produce documents"
            )));
        }

        state
            .documents
            .get(&(provider_id.to_string(), kind))
            .cloned()
            .ok_or_else(|| CapabilityError::UnknownProvider(provider_id.to_string()))
    }
}

/// Provider used when no fulfillment integration is installed.
///
/// Every provider is unknown, so return mails go out without a label.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredFulfillmentProvider;

#[async_trait]
impl FulfillmentProvider for UnconfiguredFulfillmentProvider {
    async fn retrieve_documents(
        &self,
        provider_id: &str,
        _shipping_data: &Value,
        _kind: DocumentKind,
    ) -> Result<Vec<Document>, CapabilityError> {
        Err(CapabilityError::UnknownProvider(provider_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label() -> Document {
        Document {
            base64: "bGFiZWw=".to_string(),
            mime_type: "application/pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_registered_documents() {
        let provider = InMemoryFulfillmentProvider::new();
        provider
            .set_documents("webshipper", DocumentKind::Label, vec![label()])
            .await;

        let docs = provider
            .retrieve_documents("webshipper", &json!({"id": 1}), DocumentKind::Label)
            .await
            .unwrap();
        assert_eq!(docs, vec![label()]);
        assert_eq!(provider.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_provider() {
        let provider = InMemoryFulfillmentProvider::new();
        let err = provider
            .retrieve_documents("manual", &Value::Null, DocumentKind::Label)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::UnknownProvider(p) if p == "manual"));
    }

    #[tokio::test]
    async fn unconfigured_provider_knows_no_one() {
        let err = UnconfiguredFulfillmentProvider
            .retrieve_documents("webshipper", &json!({}), DocumentKind::Label)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::UnknownProvider(p) if p == "webshipper"));
    }

    #[test]
    fn document_uses_provider_field_names() {
        let doc: Document =
            serde_json::from_value(json!({"base_64": "YQ==", "type": "image/png"})).unwrap();
        assert_eq!(doc.base64, "YQ==");
        assert_eq!(doc.mime_type, "image/png");
    }
}
