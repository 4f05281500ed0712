use domain::RetrieveConfig;

use super::missing_relation;
use crate::context::TemplateContext;
use crate::error::Result;
use crate::event::ShipmentEventData;
use crate::sources::AggregateSources;

#[tracing::instrument(skip(sources, data), fields(claim_id = %data.id))]
pub async fn shipment_created(
    sources: &AggregateSources,
    data: &ShipmentEventData,
) -> Result<TemplateContext> {
    let config =
        RetrieveConfig::new().relations(["order", "order.items", "order.shipping_address"]);
    let claim = sources.claims.retrieve(&data.id, &config).await?;
    let order = claim
        .order
        .as_deref()
        .ok_or_else(|| missing_relation("claim", &claim.id, "order"))?;
    let locale = sources.locale_resolver().resolve(order).await;

    Ok(TemplateContext::builder()
        .field("locale", locale)?
        .field("claim", &claim)?
        .field("email", &order.email)?
        .field("order", order)?
        .build())
}
