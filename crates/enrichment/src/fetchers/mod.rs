//! One fetcher per event family.
//!
//! A fetcher loads the aggregates an event refers to, computes derived
//! totals and returns a display-ready [`TemplateContext`]. Fetchers only
//! read; any repository failure propagates to the caller, except locale
//! lookups which degrade to `None`.

pub mod account;
pub mod claim;
pub mod gift_card;
pub mod order;
pub mod restock;
pub mod returns;
pub mod swap;

use common::EntityId;
use domain::{
    CurrencyCode, DomainError, LineItem, LineItemTotals, Order, RetrieveConfig, ReturnItem,
    TotalsOptions, TotalsSource,
};
use futures_util::future::try_join_all;

use crate::context::{TemplateContext, TemplateContextBuilder, normalize_thumbnail};
use crate::error::{EnrichmentError, Result};
use crate::sources::AggregateSources;

pub(crate) fn currency_of(order: &Order) -> CurrencyCode {
    CurrencyCode::new(&order.currency_code)
}

/// Computes per-line totals concurrently, failing on the first error.
pub(crate) async fn line_totals<'a>(
    sources: &AggregateSources,
    items: impl IntoIterator<Item = &'a LineItem>,
    source: TotalsSource<'_>,
    options: TotalsOptions,
) -> Result<Vec<LineItemTotals>> {
    let pending = items
        .into_iter()
        .map(|item| sources.totals.line_item_totals(item, source, options));
    Ok(try_join_all(pending).await?)
}

/// Lists the line items referenced by a return request.
pub(crate) async fn list_returned_line_items(
    sources: &AggregateSources,
    items: &[ReturnItem],
) -> Result<Vec<LineItem>> {
    let ids: Vec<EntityId> = items.iter().map(|i| i.item_id.clone()).collect();
    let config = RetrieveConfig::new().relations(["tax_lines"]);
    Ok(sources.line_items.list(&ids, &config).await?)
}

pub(crate) fn find_line_item<'a>(items: &'a [LineItem], id: &EntityId) -> Option<&'a LineItem> {
    items.iter().find(|item| &item.id == id)
}

/// Like [`find_line_item`], but a missing line is an error.
pub(crate) fn require_line_item<'a>(items: &'a [LineItem], id: &EntityId) -> Result<&'a LineItem> {
    find_line_item(items, id).ok_or_else(|| {
        DomainError::NotFound {
            entity: "line_item",
            id: id.clone(),
        }
        .into()
    })
}

pub(crate) fn missing_relation(
    entity: &'static str,
    id: &EntityId,
    relation: &'static str,
) -> EnrichmentError {
    DomainError::MissingRelation {
        entity,
        id: id.clone(),
        relation,
    }
    .into()
}

/// Line item fields with a normalized thumbnail, ready for more fields.
pub(crate) fn line_item_fields(item: &LineItem) -> Result<TemplateContextBuilder> {
    TemplateContext::builder()
        .spread("line_item", item)?
        .field("thumbnail", normalize_thumbnail(item.thumbnail.as_deref()))
}
