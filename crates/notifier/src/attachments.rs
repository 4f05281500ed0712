//! Return labels and invoices attached to return-shaped notifications.

use std::sync::Arc;

use enrichment::{EventKind, TemplateContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::{DocumentKind, FulfillmentProvider, InvoiceGenerator};

/// A named, base64-encoded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub base64: String,
}

/// Resolves the attachments for a notification from its template context.
///
/// Every failure is logged and skipped; the notification is still sent with
/// whatever attachments could be produced.
#[derive(Clone)]
pub struct AttachmentResolver {
    fulfillment: Arc<dyn FulfillmentProvider>,
}

impl AttachmentResolver {
    pub fn new(fulfillment: Arc<dyn FulfillmentProvider>) -> Self {
        Self { fulfillment }
    }

    #[tracing::instrument(skip_all, fields(event = kind.map(EventKind::name)))]
    pub async fn resolve(
        &self,
        kind: Option<EventKind>,
        context: &TemplateContext,
        invoice: Option<&dyn InvoiceGenerator>,
    ) -> Vec<Attachment> {
        if !kind.is_some_and(EventKind::produces_attachments) {
            return Vec::new();
        }
        let Some(return_request) = context.get("return_request").filter(|v| v.is_object()) else {
            return Vec::new();
        };

        let mut attachments = self.return_labels(return_request).await;

        if let Some(invoice) = invoice {
            let order = context.get("order").unwrap_or(&Value::Null);
            let items = return_request.get("items").unwrap_or(&Value::Null);
            match invoice.create_return_invoice(order, items).await {
                Ok(base64) => attachments.push(Attachment {
                    name: "invoice".to_string(),
                    mime_type: "application/pdf".to_string(),
                    base64,
                }),
                Err(error) => {
                    tracing::warn!(%error, "Skipping return invoice");
                    metrics::counter!("notification_attachment_failures_total").increment(1);
                }
            }
        }

        attachments
    }

    async fn return_labels(&self, return_request: &Value) -> Vec<Attachment> {
        let Some(method) = return_request.get("shipping_method").filter(|v| !v.is_null()) else {
            return Vec::new();
        };
        let Some(provider_id) = method
            .pointer("/shipping_option/provider_id")
            .and_then(Value::as_str)
        else {
            tracing::warn!("Return shipping method has no provider; skipping label");
            return Vec::new();
        };

        let shipping_data = return_request.get("shipping_data").unwrap_or(&Value::Null);
        match self
            .fulfillment
            .retrieve_documents(provider_id, shipping_data, DocumentKind::Label)
            .await
        {
            Ok(documents) => documents
                .into_iter()
                .map(|doc| Attachment {
                    name: "return-label".to_string(),
                    mime_type: doc.mime_type,
                    base64: doc.base64,
                })
                .collect(),
            Err(error) => {
                tracing::warn!(%error, provider_id, "Skipping return label");
                metrics::counter!("notification_attachment_failures_total").increment(1);
                Vec::new()
            }
        }
    }
}
