//! Mailer trait and in-memory implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::attachments::Attachment;
use crate::error::MailerError;

/// Values handed to the template renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLocals {
    pub data: Value,
    pub env: BTreeMap<String, String>,
}

/// A file attached to an outgoing mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAttachment {
    pub filename: String,
    /// Base64-encoded body.
    pub content: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub disposition: String,
    pub content_id: String,
}

impl From<Attachment> for MailAttachment {
    fn from(attachment: Attachment) -> Self {
        Self {
            content_id: attachment.name.clone(),
            filename: attachment.name,
            content: attachment.base64,
            mime_type: attachment.mime_type,
            disposition: "attachment".to_string(),
        }
    }
}

/// One message for the mailer to render and deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub template: String,
    /// Directory `template` is resolved against.
    pub template_root: PathBuf,
    pub from: String,
    pub to: Option<String>,
    pub locals: TemplateLocals,
    pub attachments: Vec<MailAttachment>,
}

/// Renders a template and delivers the result.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, request: &SendRequest) -> Result<(), MailerError>;
}

#[derive(Debug, Default)]
struct InMemoryMailerState {
    sent: Vec<SendRequest>,
    fail_on_send: bool,
    delay: Option<Duration>,
}

/// In-memory mailer for testing.
///
/// Accepted requests are kept in order. Requests without a recipient are
/// rejected the way an SMTP transport would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    state: Arc<RwLock<InMemoryMailerState>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the mailer to reject every request.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.write().await.fail_on_send = fail;
    }

    /// Delays every send by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.write().await.delay = Some(delay);
    }

    pub async fn sent(&self) -> Vec<SendRequest> {
        self.state.read().await.sent.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, request: &SendRequest) -> Result<(), MailerError> {
        let delay = self.state.read().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        if state.fail_on_send {
            return Err(MailerError::Rejected("550 mailbox unavailable".to_string()));
        }
        if request.to.as_deref().is_none_or(str::is_empty) {
            return Err(MailerError::MissingRecipient);
        }

        state.sent.push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(to: Option<&str>) -> SendRequest {
        SendRequest {
            template: "order-placed".to_string(),
            template_root: PathBuf::from("data/emailTemplates"),
            from: "shop@example.com".to_string(),
            to: to.map(str::to_string),
            locals: TemplateLocals {
                data: json!({"display_id": 7}),
                env: BTreeMap::new(),
            },
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn records_accepted_requests() {
        let mailer = InMemoryMailer::new();
        mailer.send(&request(Some("a@example.com"))).await.unwrap();

        assert_eq!(mailer.sent_count().await, 1);
        assert_eq!(mailer.sent().await[0].to.as_deref(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn rejects_missing_recipient() {
        let mailer = InMemoryMailer::new();
        let err = mailer.send(&request(None)).await.unwrap_err();
        assert!(matches!(err, MailerError::MissingRecipient));
        assert_eq!(mailer.sent_count().await, 0);
    }

    #[tokio::test]
    async fn fail_toggle() {
        let mailer = InMemoryMailer::new();
        mailer.set_fail_on_send(true).await;
        assert!(mailer.send(&request(Some("a@example.com"))).await.is_err());

        mailer.set_fail_on_send(false).await;
        assert!(mailer.send(&request(Some("a@example.com"))).await.is_ok());
    }

    #[test]
    fn attachment_wire_shape() {
        let part = MailAttachment::from(Attachment {
            name: "invoice".to_string(),
            mime_type: "application/pdf".to_string(),
            base64: "JVBERi0=".to_string(),
        });
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({
                "filename": "invoice",
                "content": "JVBERi0=",
                "type": "application/pdf",
                "disposition": "attachment",
                "content_id": "invoice",
            })
        );
    }
}
