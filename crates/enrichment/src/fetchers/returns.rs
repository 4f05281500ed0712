//! Return requested and items returned.

use domain::money::percentage_of;
use domain::{RetrieveConfig, ShippingMethod, TotalsOptions, TotalsSource};

use super::{
    currency_of, line_item_fields, line_totals, list_returned_line_items, require_line_item,
};
use crate::context::{TemplateContext, TemplateContextBuilder, format_date};
use crate::error::Result;
use crate::event::ReturnEventData;
use crate::sources::AggregateSources;

const RETURN_RELATIONS: [&str; 8] = [
    "items",
    "items.item",
    "items.item.tax_lines",
    "items.item.variant",
    "items.item.variant.product",
    "shipping_method",
    "shipping_method.tax_lines",
    "shipping_method.shipping_option",
];

const ORDER_RELATIONS: [&str; 6] = [
    "items",
    "items.tax_lines",
    "discounts",
    "discounts.rule",
    "shipping_address",
    "returns",
];

/// Return shipping price including tax, rounded per tax line.
///
/// Zero when the return has no shipping method.
pub fn return_shipping_total(method: Option<&ShippingMethod>) -> i64 {
    method.map_or(0, |method| {
        let tax: i64 = method
            .tax_lines
            .iter()
            .map(|line| percentage_of(method.price, line.rate_or_zero()))
            .sum();
        method.price + tax
    })
}

/// Builds the context for both `order.return_requested` and
/// `order.items_returned`.
///
/// Line totals are those of the order's line items; the returned quantity
/// is reported alongside.
#[tracing::instrument(skip(sources, data), fields(order_id = %data.id, return_id = %data.return_id))]
pub async fn requested(sources: &AggregateSources, data: &ReturnEventData) -> Result<TemplateContext> {
    let return_request = sources
        .returns
        .retrieve(&data.return_id, &RetrieveConfig::new().relations(RETURN_RELATIONS))
        .await?;
    let line_items = list_returned_line_items(sources, &return_request.items).await?;

    let order_config = RetrieveConfig::new()
        .select(["total"])
        .relations(ORDER_RELATIONS);
    let order = sources.orders.retrieve(&data.id, &order_config).await?;
    let currency = currency_of(&order);
    let fmt = &sources.formatter;

    let found = return_request
        .items
        .iter()
        .map(|item| require_line_item(&line_items, &item.item_id))
        .collect::<Result<Vec<_>>>()?;

    let totals = line_totals(
        sources,
        found.iter().copied(),
        TotalsSource::Order(&order),
        TotalsOptions::with_tax_lines(),
    )
    .await?;

    let items = found
        .iter()
        .zip(&return_request.items)
        .zip(&totals)
        .map(|((line, returned), totals)| {
            line_item_fields(line)?
                .field("quantity", returned.quantity)?
                .field("totals", totals)?
                .field("price", fmt.display(totals.total, &currency))?
                .field("tax_lines", &totals.tax_lines)
                .map(TemplateContextBuilder::build)
        })
        .collect::<Result<Vec<_>>>()?;

    let item_subtotal: i64 = totals.iter().map(|t| t.total).sum();
    let shipping_total = return_shipping_total(return_request.shipping_method.as_ref());
    let refund_amount = fmt.display(return_request.refund_amount, &currency);

    let return_context = TemplateContext::builder()
        .spread("return_request", &return_request)?
        .field("refund_amount", &refund_amount)?
        .build();

    let locale = sources.locale_resolver().resolve(&order).await;

    Ok(TemplateContext::builder()
        .field("locale", locale)?
        .field("has_shipping", return_request.shipping_method.is_some())?
        .field("email", &order.email)?
        .field("items", items)?
        .field("subtotal", fmt.display(item_subtotal, &currency))?
        .field("shipping_total", fmt.display(shipping_total, &currency))?
        .field("refund_amount", refund_amount)?
        .field("return_request", return_context)?
        .field("order", &order)?
        .field("date", format_date(&return_request.updated_at))?
        .build())
}
