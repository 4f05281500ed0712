//! Back-in-stock notifications.

use domain::RetrieveConfig;

use super::missing_relation;
use crate::context::{TemplateContext, normalize_thumbnail};
use crate::error::Result;
use crate::event::RestockEventData;
use crate::sources::AggregateSources;

/// Builds the shared context for every subscriber of a restocked variant.
///
/// The context has no `email`; callers address one mail per subscriber.
#[tracing::instrument(skip(sources, data), fields(variant_id = %data.variant_id, subscribers = data.emails.len()))]
pub async fn restocked(
    sources: &AggregateSources,
    data: &RestockEventData,
) -> Result<TemplateContext> {
    let config = RetrieveConfig::new().relations(["product"]);
    let variant = sources.variants.retrieve(&data.variant_id, &config).await?;
    let product = variant
        .product
        .as_ref()
        .ok_or_else(|| missing_relation("product_variant", &variant.id, "product"))?;

    let product = TemplateContext::builder()
        .spread("product", product)?
        .field("thumbnail", normalize_thumbnail(product.thumbnail.as_deref()))?
        .build();

    Ok(TemplateContext::builder()
        .field("product", product)?
        .field("variant", &variant)?
        .field("variant_id", &data.variant_id)?
        .field("emails", &data.emails)?
        .build())
}
