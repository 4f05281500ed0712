//! Swap created, received and shipped.

use common::EntityId;
use domain::{
    Cart, LineItem, Order, RetrieveConfig, ReturnRequest, Store, Swap, TotalsOptions,
    TotalsSource,
};

use super::{
    currency_of, find_line_item, line_item_fields, line_totals, list_returned_line_items,
    missing_relation, require_line_item,
};
use crate::context::{TemplateContext, TemplateContextBuilder, format_date};
use crate::error::Result;
use crate::event::{EntityEventData, ShipmentEventData, SwapReceivedEventData};
use crate::sources::AggregateSources;

const SWAP_RELATIONS: [&str; 7] = [
    "additional_items",
    "additional_items.tax_lines",
    "return_order",
    "return_order.items",
    "return_order.items.item",
    "return_order.shipping_method",
    "return_order.shipping_method.shipping_option",
];

const SWAP_ORDER_RELATIONS: [&str; 7] = [
    "items",
    "discounts",
    "discounts.rule",
    "shipping_address",
    "swaps",
    "swaps.additional_items",
    "swaps.additional_items.tax_lines",
];

const SHIPPED_SWAP_RELATIONS: [&str; 7] = [
    "shipping_address",
    "shipping_methods",
    "shipping_methods.tax_lines",
    "additional_items",
    "additional_items.tax_lines",
    "return_order",
    "return_order.items",
];

const SHIPPED_ORDER_RELATIONS: [&str; 8] = [
    "region",
    "items",
    "items.tax_lines",
    "discounts",
    "discounts.rule",
    "swaps",
    "swaps.additional_items",
    "swaps.additional_items.tax_lines",
];

const CART_SELECT: [&str; 5] = [
    "total",
    "tax_total",
    "discount_total",
    "shipping_total",
    "subtotal",
];

fn cart_config() -> RetrieveConfig {
    RetrieveConfig::new()
        .select(CART_SELECT)
        .relations(["items", "items.tax_lines", "region"])
}

/// Link to the swap's checkout, from the store's link template.
///
/// The first `{cart_id}` placeholder is replaced; no template yields `""`.
pub fn swap_link(template: Option<&str>, cart_id: &EntityId) -> String {
    template
        .map(|t| t.replacen("{cart_id}", cart_id.as_str(), 1))
        .unwrap_or_default()
}

/// Everything the created and received contexts are built from.
struct SwapBundle {
    store: Store,
    swap: Swap,
    return_request: ReturnRequest,
    order: Order,
    cart: Cart,
    cart_id: EntityId,
}

async fn load_swap(sources: &AggregateSources, id: &EntityId) -> Result<SwapBundle> {
    let store = sources.store.retrieve().await?;
    let swap = sources
        .swaps
        .retrieve(id, &RetrieveConfig::new().relations(SWAP_RELATIONS))
        .await?;

    let mut return_request = swap
        .return_order
        .clone()
        .ok_or_else(|| missing_relation("swap", &swap.id, "return_order"))?;
    let line_items = list_returned_line_items(sources, &return_request.items).await?;
    for returned in &mut return_request.items {
        returned.item = find_line_item(&line_items, &returned.item_id).cloned();
    }

    let order_config = RetrieveConfig::new()
        .select(["total"])
        .relations(SWAP_ORDER_RELATIONS);
    let order = sources.orders.retrieve(&swap.order_id, &order_config).await?;

    let cart_id = swap
        .cart_id
        .clone()
        .ok_or_else(|| missing_relation("swap", &swap.id, "cart"))?;
    let cart = sources.carts.retrieve(&cart_id, &cart_config()).await?;

    Ok(SwapBundle {
        store,
        swap,
        return_request,
        order,
        cart,
        cart_id,
    })
}

/// Context fields common to created and received.
async fn swap_fields(
    sources: &AggregateSources,
    bundle: &SwapBundle,
    items: Vec<TemplateContext>,
    return_items: Vec<TemplateContext>,
) -> Result<TemplateContextBuilder> {
    let currency = currency_of(&bundle.order);
    let locale = sources.locale_resolver().resolve(&bundle.order).await;
    let link = swap_link(bundle.store.swap_link_template.as_deref(), &bundle.cart_id);

    TemplateContext::builder()
        .field("locale", locale)?
        .field("swap", &bundle.swap)?
        .field("order", &bundle.order)?
        .field("return_request", &bundle.return_request)?
        .field("date", format_date(&bundle.swap.updated_at))?
        .field("swap_link", link)?
        .field("email", &bundle.order.email)?
        .field("items", items)?
        .field("return_items", return_items)?
        .field(
            "refund_amount",
            sources
                .formatter
                .display(bundle.return_request.refund_amount, &currency),
        )
}

#[tracing::instrument(skip(sources, data), fields(swap_id = %data.id))]
pub async fn created(sources: &AggregateSources, data: &EntityEventData) -> Result<TemplateContext> {
    let bundle = load_swap(sources, &data.id).await?;
    let currency = currency_of(&bundle.order);
    let fmt = &sources.formatter;

    let totals = line_totals(
        sources,
        &bundle.cart.items,
        TotalsSource::Cart(&bundle.cart),
        TotalsOptions::with_tax(),
    )
    .await?;

    let mut items = Vec::new();
    let mut return_items = Vec::new();
    let mut return_total = 0;
    let mut additional_total = 0;

    for (item, totals) in bundle.cart.items.iter().zip(&totals) {
        let decorated = TemplateContext::builder()
            .spread("line_item", item)?
            .field("totals", totals)?
            .field("tax_lines", &totals.tax_lines)?
            .field(
                "price",
                fmt.display_per_unit(totals.original_total, item.quantity, &currency),
            )?
            .field(
                "discounted_price",
                fmt.display_per_unit(totals.total, item.quantity, &currency),
            )?
            .build();

        if item.is_return {
            if item.variant_id.is_some() {
                return_total -= totals.total;
            }
            return_items.push(decorated);
        } else {
            additional_total += totals.total;
            items.push(decorated);
        }
    }

    Ok(swap_fields(sources, &bundle, items, return_items)
        .await?
        .field("return_total", fmt.display(return_total, &currency))?
        .field("additional_total", fmt.display(additional_total, &currency))?
        .build())
}

/// Like [`created`], but lines are priced as bare amounts without a
/// currency suffix.
#[tracing::instrument(skip(sources, data), fields(swap_id = %data.id))]
pub async fn received(
    sources: &AggregateSources,
    data: &SwapReceivedEventData,
) -> Result<TemplateContext> {
    let bundle = load_swap(sources, &data.id).await?;
    let currency = currency_of(&bundle.order);
    let fmt = &sources.formatter;

    let totals = line_totals(
        sources,
        &bundle.cart.items,
        TotalsSource::Cart(&bundle.cart),
        TotalsOptions::with_tax(),
    )
    .await?;

    let mut items = Vec::new();
    let mut return_items = Vec::new();
    let mut return_total = 0;
    let mut additional_total = 0;

    for (item, totals) in bundle.cart.items.iter().zip(&totals) {
        let gross = totals.subtotal + totals.tax_total;
        let decorated = TemplateContext::builder()
            .spread("line_item", item)?
            .field("totals", totals)?
            .field("price", fmt.format(gross, &currency))?
            .build();

        if item.is_return {
            return_total -= gross;
            return_items.push(decorated);
        } else {
            additional_total += gross;
            items.push(decorated);
        }
    }

    Ok(swap_fields(sources, &bundle, items, return_items)
        .await?
        .field("return_total", fmt.display(return_total, &currency))?
        .field("tax_total", fmt.display(bundle.cart.total.unwrap_or(0), &currency))?
        .field("additional_total", fmt.display(additional_total, &currency))?
        .build())
}

#[tracing::instrument(
    skip(sources, data),
    fields(swap_id = %data.id, fulfillment_id = %data.fulfillment_id)
)]
pub async fn shipment_created(
    sources: &AggregateSources,
    data: &ShipmentEventData,
) -> Result<TemplateContext> {
    let swap = sources
        .swaps
        .retrieve(&data.id, &RetrieveConfig::new().relations(SHIPPED_SWAP_RELATIONS))
        .await?;
    let order = sources
        .orders
        .retrieve(
            &swap.order_id,
            &RetrieveConfig::new().relations(SHIPPED_ORDER_RELATIONS),
        )
        .await?;
    let cart_id = swap
        .cart_id
        .as_ref()
        .ok_or_else(|| missing_relation("swap", &swap.id, "cart"))?;
    let cart = sources.carts.retrieve(cart_id, &cart_config()).await?;

    let return_request = swap
        .return_order
        .as_ref()
        .ok_or_else(|| missing_relation("swap", &swap.id, "return_order"))?;
    let line_items = list_returned_line_items(sources, &return_request.items).await?;

    let currency = currency_of(&order);
    let fmt = &sources.formatter;

    let found = return_request
        .items
        .iter()
        .map(|item| require_line_item(&line_items, &item.item_id))
        .collect::<Result<Vec<_>>>()?;
    let return_totals = line_totals(
        sources,
        found.iter().copied(),
        TotalsSource::Cart(&cart),
        TotalsOptions::with_tax(),
    )
    .await?;

    let mut returned_lines = Vec::with_capacity(found.len());
    let mut return_items = Vec::with_capacity(found.len());
    for ((line, returned), totals) in found.iter().zip(&return_request.items).zip(&return_totals) {
        return_items.push(
            line_item_fields(line)?
                .field(
                    "price",
                    fmt.display_per_unit(totals.original_total, returned.quantity, &currency),
                )?
                .field(
                    "discounted_price",
                    fmt.display_per_unit(totals.total, returned.quantity, &currency),
                )?
                .field("quantity", returned.quantity)?
                .build(),
        );
        returned_lines.push(LineItem {
            quantity: returned.quantity,
            ..(*line).clone()
        });
    }

    let return_total = sources.totals.refund_total(&order, &returned_lines).await?;

    let shipped_order = Order {
        shipping_methods: swap.shipping_methods.clone(),
        items: swap.additional_items.clone(),
        ..order.clone()
    };
    let additional_total = sources.totals.order_total(&shipped_order).await?;

    let additional_totals = line_totals(
        sources,
        &swap.additional_items,
        TotalsSource::Cart(&cart),
        TotalsOptions::with_tax(),
    )
    .await?;
    let items = swap
        .additional_items
        .iter()
        .zip(&additional_totals)
        .map(|(item, totals)| {
            line_item_fields(item)?
                .field(
                    "price",
                    fmt.display_per_unit(totals.original_total, item.quantity, &currency),
                )?
                .field(
                    "discounted_price",
                    fmt.display_per_unit(totals.total, item.quantity, &currency),
                )?
                .field("quantity", item.quantity)
                .map(TemplateContextBuilder::build)
        })
        .collect::<Result<Vec<_>>>()?;

    let locale = sources.locale_resolver().resolve(&order).await;

    Ok(TemplateContext::builder()
        .field("locale", locale)?
        .field("swap", &swap)?
        .field("order", &order)?
        .field("items", items)?
        .field("return_items", return_items)?
        .field("date", format_date(&swap.updated_at))?
        .field("email", &order.email)?
        .field("tax_amount", fmt.display(cart.tax_total.unwrap_or(0), &currency))?
        .field("paid_total", fmt.display(swap.difference_due, &currency))?
        .field("return_total", fmt.display(return_total, &currency))?
        .field("refund_amount", fmt.display(return_request.refund_amount, &currency))?
        .field("additional_total", fmt.display(additional_total, &currency))?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_replaces_first_placeholder() {
        let cart_id = EntityId::new("cart_9");
        assert_eq!(
            swap_link(Some("https://shop.example/swap?c={cart_id}"), &cart_id),
            "https://shop.example/swap?c=cart_9"
        );
        assert_eq!(
            swap_link(Some("{cart_id}/{cart_id}"), &cart_id),
            "cart_9/{cart_id}"
        );
    }

    #[test]
    fn link_without_template_is_empty() {
        assert_eq!(swap_link(None, &EntityId::new("cart_9")), "");
    }
}
