//! The entry point for events arriving from the bus.

use std::sync::Arc;

use enrichment::{EventKind, NotificationEvent};
use notification_store::{NotificationId, NotificationRecord, NotificationStore, NotificationStoreExt};
use serde_json::Value;

use crate::assembler::{NotificationAssembler, NotificationOutcome, ResendOverrides};
use crate::error::Result;
use crate::services::InvoiceGenerator;

/// Sends notifications for bus events and records every attempt.
#[derive(Clone)]
pub struct NotificationSubscriber {
    assembler: NotificationAssembler,
    store: Arc<dyn NotificationStore>,
    invoice: Option<Arc<dyn InvoiceGenerator>>,
}

impl NotificationSubscriber {
    pub fn new(assembler: NotificationAssembler, store: Arc<dyn NotificationStore>) -> Self {
        Self {
            assembler,
            store,
            invoice: None,
        }
    }

    /// Attaches return invoices to return-shaped notifications.
    pub fn with_invoice_generator(mut self, invoice: Arc<dyn InvoiceGenerator>) -> Self {
        self.invoice = Some(invoice);
        self
    }

    pub fn assembler(&self) -> &NotificationAssembler {
        &self.assembler
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// Handles one bus event.
    ///
    /// Never fails: errors are logged and counted, and the returned list is
    /// empty. Events the host flagged `no_notification` are skipped.
    #[tracing::instrument(skip(self, payload))]
    pub async fn handle(&self, name: &str, payload: Value) -> Vec<NotificationOutcome> {
        match self.try_handle(name, payload).await {
            Ok(outcomes) => outcomes,
            Err(error) => {
                tracing::error!(%error, "Failed to handle notification event");
                metrics::counter!("notification_events_failed_total").increment(1);
                Vec::new()
            }
        }
    }

    async fn try_handle(&self, name: &str, payload: Value) -> Result<Vec<NotificationOutcome>> {
        let outcomes = if name == EventKind::RestockNotificationRestocked.name() {
            self.assembler.send_restock_notifications(payload).await?
        } else {
            let event = NotificationEvent::parse(name, payload)?;
            if event.is_suppressed() {
                tracing::debug!("Event flagged no_notification");
                return Ok(Vec::new());
            }
            vec![self.assembler.send_event(&event, self.invoice.as_deref()).await?]
        };

        for outcome in outcomes.iter().filter(|o| o.status.was_attempted()) {
            let record = NotificationRecord::new(name, outcome.to.clone(), outcome.data.clone());
            self.store.append(record).await?;
        }

        Ok(outcomes)
    }

    /// Resends a stored notification and records the resend.
    ///
    /// The new record points at the original through `parent_id`.
    #[tracing::instrument(skip(self, overrides))]
    pub async fn resend(
        &self,
        id: NotificationId,
        overrides: ResendOverrides,
    ) -> Result<NotificationOutcome> {
        let record = self.store.get_required(id).await?;
        let outcome = self
            .assembler
            .resend_notification(&record, &overrides, self.invoice.as_deref())
            .await;

        if outcome.status.was_attempted() {
            let resent = NotificationRecord::new(
                record.event_name.clone(),
                outcome.to.clone(),
                outcome.data.clone(),
            )
            .resend_of(record.id);
            self.store.append(resent).await?;
        }

        Ok(outcome)
    }
}
