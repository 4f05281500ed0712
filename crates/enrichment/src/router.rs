//! Event to fetcher routing.

use serde_json::Value;

use crate::context::TemplateContext;
use crate::error::Result;
use crate::event::NotificationEvent;
use crate::fetchers::{account, claim, gift_card, order, restock, returns, swap};
use crate::sources::AggregateSources;

/// Maps every known event to exactly one fetcher.
#[derive(Clone)]
pub struct EventRouter {
    sources: AggregateSources,
}

impl EventRouter {
    pub fn new(sources: AggregateSources) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &AggregateSources {
        &self.sources
    }

    /// Builds the template context for an event.
    ///
    /// Unknown events produce an empty context without touching any
    /// repository.
    #[tracing::instrument(skip(self, event), fields(event = event.name()))]
    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<TemplateContext> {
        let start = std::time::Instant::now();
        let sources = &self.sources;

        let context = match event {
            NotificationEvent::OrderPlaced(data) => order::placed(sources, data).await,
            NotificationEvent::OrderCanceled(data) => order::canceled(sources, data).await,
            NotificationEvent::OrderShipmentCreated(data) => {
                order::shipment_created(sources, data).await
            }
            NotificationEvent::OrderGiftCardCreated(data)
            | NotificationEvent::GiftCardCreated(data) => gift_card::created(sources, data).await,
            NotificationEvent::OrderReturnRequested(data)
            | NotificationEvent::OrderItemsReturned(data) => {
                returns::requested(sources, data).await
            }
            NotificationEvent::SwapCreated(data) => swap::created(sources, data).await,
            NotificationEvent::SwapReceived(data) => swap::received(sources, data).await,
            NotificationEvent::SwapShipmentCreated(data) => {
                swap::shipment_created(sources, data).await
            }
            NotificationEvent::ClaimShipmentCreated(data) => {
                claim::shipment_created(sources, data).await
            }
            NotificationEvent::UserPasswordReset(data) => account::user_password_reset(data),
            NotificationEvent::CustomerPasswordReset(data) => {
                account::customer_password_reset(data)
            }
            NotificationEvent::InviteCreated(data) => account::invite_created(data),
            NotificationEvent::RestockNotificationRestocked(data) => {
                restock::restocked(sources, data).await
            }
            NotificationEvent::Unknown(name) => {
                tracing::debug!(event = %name, "No fetcher for event");
                Ok(TemplateContext::empty())
            }
        };

        match &context {
            Ok(_) => metrics::counter!("enrichment_contexts_built").increment(1),
            Err(error) => {
                tracing::warn!(%error, "Enrichment failed");
                metrics::counter!("enrichment_failures_total").increment(1);
            }
        }
        metrics::histogram!("enrichment_duration_seconds").record(start.elapsed().as_secs_f64());

        context
    }

    /// Parses a raw payload for `name` and dispatches it.
    pub async fn dispatch_raw(&self, name: &str, payload: Value) -> Result<TemplateContext> {
        let event = NotificationEvent::parse(name, payload)?;
        self.dispatch(&event).await
    }
}
