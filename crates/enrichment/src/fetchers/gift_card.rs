//! Gift card created, directly or as part of an order.

use domain::RetrieveConfig;

use crate::context::TemplateContext;
use crate::error::Result;
use crate::event::EntityEventData;
use crate::sources::AggregateSources;

/// Face value including the region's tax.
///
/// `tax_rate` is a percentage; an unset rate counts as zero.
pub fn display_value(value: i64, tax_rate: Option<f64>) -> f64 {
    value as f64 * (1.0 + tax_rate.unwrap_or(0.0) / 100.0)
}

#[tracing::instrument(skip(sources, data), fields(gift_card_id = %data.id))]
pub async fn created(sources: &AggregateSources, data: &EntityEventData) -> Result<TemplateContext> {
    let config = RetrieveConfig::new().relations(["region", "order"]);
    let gift_card = sources.gift_cards.retrieve(&data.id, &config).await?;

    let Some(order) = gift_card.order.as_deref() else {
        tracing::debug!("Gift card has no order, nothing to notify");
        return Ok(TemplateContext::empty());
    };

    let tax_rate = gift_card.region.as_ref().and_then(|r| r.tax_rate);
    let locale = sources.locale_resolver().resolve(order).await;

    Ok(TemplateContext::builder()
        .spread("gift_card", &gift_card)?
        .field("locale", locale)?
        .field("email", &order.email)?
        .field("display_value", display_value(gift_card.value, tax_rate))?
        .build())
}
