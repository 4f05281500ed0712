//! Turns events into sent mail.
//!
//! The assembler gates every event on a configured template, builds the
//! template context through the [`EventRouter`], resolves attachments and
//! hands the result to the [`Mailer`]. Delivery failures are reported in the
//! outcome status; only enrichment failures are returned as errors.

use std::sync::Arc;
use std::time::Instant;

use enrichment::{EventKind, EventRouter, NotificationEvent, TemplateContext};
use futures_util::{StreamExt, TryStreamExt, stream};
use notification_store::NotificationRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attachments::{Attachment, AttachmentResolver};
use crate::config::NotifierConfig;
use crate::error::{MailerError, NotifierError, Result};
use crate::services::{FulfillmentProvider, InvoiceGenerator, Mailer, SendRequest, TemplateLocals};

/// What happened to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationStatus {
    Sent,
    Failed,
    NoTemplateFound,
    NoDataFound,
}

impl NotificationStatus {
    /// True when the mailer was invoked.
    pub fn was_attempted(self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

/// The result of one send, without attachment bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub to: Option<String>,
    pub status: NotificationStatus,
    pub data: Value,
}

/// A manual send of a named template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailOptions {
    pub template_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default)]
    pub data: Value,
}

/// Replacement values for a resend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendOverrides {
    #[serde(default)]
    pub to: Option<String>,
}

/// Assembles and delivers notifications.
#[derive(Clone)]
pub struct NotificationAssembler {
    router: EventRouter,
    mailer: Arc<dyn Mailer>,
    attachments: AttachmentResolver,
    config: Arc<NotifierConfig>,
}

impl NotificationAssembler {
    pub fn new(
        router: EventRouter,
        mailer: Arc<dyn Mailer>,
        fulfillment: Arc<dyn FulfillmentProvider>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            router,
            mailer,
            attachments: AttachmentResolver::new(fulfillment),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn template_name_for_event(&self, event: &str) -> Option<&str> {
        self.config.template_name_for_event(event)
    }

    /// Enriches and sends the notification for one event.
    ///
    /// Events without a template report `noDataFound` and touch nothing.
    #[tracing::instrument(skip(self, payload, invoice))]
    pub async fn send_notification(
        &self,
        name: &str,
        payload: Value,
        invoice: Option<&dyn InvoiceGenerator>,
    ) -> Result<NotificationOutcome> {
        let Some(template) = self.template_name_for_event(name) else {
            tracing::debug!("No template configured");
            return Ok(no_data_found());
        };
        let event = NotificationEvent::parse(name, payload)?;
        self.send_with_template(template, &event, invoice).await
    }

    /// Sends an already decoded event.
    pub async fn send_event(
        &self,
        event: &NotificationEvent,
        invoice: Option<&dyn InvoiceGenerator>,
    ) -> Result<NotificationOutcome> {
        match self.template_name_for_event(event.name()) {
            Some(template) => self.send_with_template(template, event, invoice).await,
            None => Ok(no_data_found()),
        }
    }

    async fn send_with_template(
        &self,
        template: &str,
        event: &NotificationEvent,
        invoice: Option<&dyn InvoiceGenerator>,
    ) -> Result<NotificationOutcome> {
        let context = self.fetch(event).await?;
        let attachments = self.attachments.resolve(event.kind(), &context, invoice).await;

        let to = context.email().map(str::to_string);
        let data = context.into_value();
        let status = self
            .deliver(template, None, to.clone(), data.clone(), attachments)
            .await;

        Ok(NotificationOutcome { to, status, data })
    }

    /// Sends a stored notification again from its recorded data.
    ///
    /// No aggregate is fetched. Attachments are resolved from the stored
    /// data, or from its nested `dynamic_template_data` when present.
    #[tracing::instrument(skip_all, fields(id = %record.id, event = %record.event_name))]
    pub async fn resend_notification(
        &self,
        record: &NotificationRecord,
        overrides: &ResendOverrides,
        invoice: Option<&dyn InvoiceGenerator>,
    ) -> NotificationOutcome {
        let Some(template) = self.template_name_for_event(&record.event_name) else {
            return NotificationOutcome {
                to: record.to.clone(),
                status: NotificationStatus::NoTemplateFound,
                data: record.data.clone(),
            };
        };

        let to = overrides.to.clone().or_else(|| record.to.clone());
        let source = record
            .data
            .get("dynamic_template_data")
            .filter(|nested| nested.is_object())
            .unwrap_or(&record.data);
        let context = TemplateContext::from_value(source.clone()).unwrap_or_default();
        let attachments = self
            .attachments
            .resolve(EventKind::from_name(&record.event_name), &context, invoice)
            .await;

        let status = self
            .deliver(template, None, to.clone(), record.data.clone(), attachments)
            .await;

        NotificationOutcome {
            to,
            status,
            data: record.data.clone(),
        }
    }

    /// Sends a template directly. The outcome echoes the options.
    #[tracing::instrument(skip_all, fields(template = %options.template_name))]
    pub async fn send_email(&self, options: SendEmailOptions) -> Result<NotificationOutcome> {
        let status = self
            .deliver(
                &options.template_name,
                options.from.clone(),
                Some(options.to.clone()),
                options.data.clone(),
                Vec::new(),
            )
            .await;

        Ok(NotificationOutcome {
            to: Some(options.to.clone()),
            status,
            data: serde_json::to_value(&options)?,
        })
    }

    /// Mails every subscriber of a restocked variant.
    ///
    /// Sends run concurrently up to the configured limit. Returns nothing
    /// when no template is configured or nobody is waiting.
    #[tracing::instrument(skip_all)]
    pub async fn send_restock_notifications(
        &self,
        payload: Value,
    ) -> Result<Vec<NotificationOutcome>> {
        let name = EventKind::RestockNotificationRestocked.name();
        let Some(template) = self.template_name_for_event(name) else {
            return Ok(Vec::new());
        };

        let event = NotificationEvent::parse(name, payload)?;
        let context = self.fetch(&event).await?;

        let emails: Vec<String> = context
            .get("emails")
            .and_then(Value::as_array)
            .map(|emails| {
                emails
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if emails.is_empty() {
            tracing::debug!("No restock subscribers");
            return Ok(Vec::new());
        }

        let data = context.into_value();
        stream::iter(emails)
            .map(|to| {
                self.send_email(SendEmailOptions {
                    template_name: template.to_string(),
                    from: None,
                    to,
                    data: data.clone(),
                })
            })
            .buffer_unordered(self.config.restock_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn fetch(&self, event: &NotificationEvent) -> Result<TemplateContext> {
        let start = Instant::now();
        let dispatch = self.router.dispatch(event);

        let context = match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, dispatch).await.map_err(|_| {
                NotifierError::FetchTimeout {
                    event: event.name().to_string(),
                }
            })??,
            None => dispatch.await?,
        };

        metrics::histogram!("notification_fetch_seconds").record(start.elapsed().as_secs_f64());
        Ok(context)
    }

    async fn deliver(
        &self,
        template: &str,
        from: Option<String>,
        to: Option<String>,
        data: Value,
        attachments: Vec<Attachment>,
    ) -> NotificationStatus {
        let request = SendRequest {
            template: template.to_string(),
            template_root: self.config.template_root.clone(),
            from: from.unwrap_or_else(|| self.config.from_email.clone()),
            to,
            locals: TemplateLocals {
                data,
                env: self.config.template_env.clone(),
            },
            attachments: attachments.into_iter().map(Into::into).collect(),
        };

        let result = match self.config.send_timeout {
            Some(limit) => tokio::time::timeout(limit, self.mailer.send(&request))
                .await
                .unwrap_or(Err(MailerError::Timeout)),
            None => self.mailer.send(&request).await,
        };

        match result {
            Ok(()) => {
                tracing::info!(template, to = ?request.to, "Notification sent");
                metrics::counter!("notifications_sent_total").increment(1);
                NotificationStatus::Sent
            }
            Err(error) => {
                tracing::warn!(%error, template, to = ?request.to, "Notification failed");
                metrics::counter!("notifications_failed_total").increment(1);
                NotificationStatus::Failed
            }
        }
    }
}

fn no_data_found() -> NotificationOutcome {
    NotificationOutcome {
        to: None,
        status: NotificationStatus::NoDataFound,
        data: Value::Object(Map::new()),
    }
}
