//! Order placed, canceled and shipped.

use domain::money::scale_by_rate;
use domain::{
    CurrencyCode, Discount, DiscountRuleType, LineItemTotals, Order, RetrieveConfig,
    TotalsOptions, TotalsSource,
};

use super::{currency_of, line_item_fields, line_totals};
use crate::context::{TemplateContext, TemplateContextBuilder, format_date};
use crate::error::Result;
use crate::event::{EntityEventData, ShipmentEventData};
use crate::sources::AggregateSources;

const ORDER_SELECT: [&str; 7] = [
    "shipping_total",
    "discount_total",
    "tax_total",
    "refunded_total",
    "gift_card_total",
    "subtotal",
    "total",
];

const ORDER_RELATIONS: [&str; 12] = [
    "customer",
    "billing_address",
    "shipping_address",
    "discounts",
    "discounts.rule",
    "shipping_methods",
    "shipping_methods.shipping_option",
    "payments",
    "fulfillments",
    "returns",
    "gift_cards",
    "gift_card_transactions",
];

fn order_config() -> RetrieveConfig {
    RetrieveConfig::new()
        .select(ORDER_SELECT)
        .relations(ORDER_RELATIONS)
}

/// Sums over the per-line totals of a placed order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderSummary {
    /// Undiscounted lines including tax.
    pub subtotal: i64,
    /// Discounted lines including tax.
    pub discounted_subtotal: i64,
    /// Difference of the two, so discounts are shown tax-inclusive.
    pub discount_total: i64,
    pub subtotal_ex_tax: i64,
}

impl OrderSummary {
    pub fn from_totals(totals: &[LineItemTotals]) -> Self {
        totals.iter().fold(Self::default(), |acc, t| Self {
            subtotal: acc.subtotal + t.original_total,
            discounted_subtotal: acc.discounted_subtotal + t.total,
            discount_total: acc.discount_total + t.original_total - t.total,
            subtotal_ex_tax: acc.subtotal_ex_tax + t.subtotal,
        })
    }
}

/// Short label for a discount, `"10%"` or `"500 USD"`.
pub fn discount_descriptor(discount: &Discount, currency: &CurrencyCode) -> String {
    match discount.rule.kind {
        DiscountRuleType::Percentage => format!("{}%", discount.rule.value),
        _ => format!("{} {}", discount.rule.value, currency),
    }
}

fn discount_contexts(order: &Order, currency: &CurrencyCode) -> Result<Vec<TemplateContext>> {
    order
        .discounts
        .iter()
        .map(|discount| {
            TemplateContext::builder()
                .spread("discount", discount)?
                .field("is_giftcard", false)?
                .field("code", &discount.code)?
                .field("descriptor", discount_descriptor(discount, currency))
                .map(TemplateContextBuilder::build)
        })
        .collect()
}

/// Fields shared by the placed and canceled contexts.
fn order_fields(
    order: &Order,
    locale: Option<String>,
    items: Vec<TemplateContext>,
    currency: &CurrencyCode,
) -> Result<TemplateContextBuilder> {
    TemplateContext::builder()
        .spread("order", order)?
        .field("locale", locale)?
        .field("email", &order.email)?
        .field("has_discounts", order.discounts.len())?
        .field("has_gift_cards", order.gift_cards.len())?
        .field("date", format_date(&order.created_at))?
        .field("items", items)?
        .field("discounts", discount_contexts(order, currency)?)
}

#[tracing::instrument(skip(sources, data), fields(order_id = %data.id))]
pub async fn placed(sources: &AggregateSources, data: &EntityEventData) -> Result<TemplateContext> {
    let order = sources.orders.retrieve(&data.id, &order_config()).await?;
    let currency = currency_of(&order);
    let fmt = &sources.formatter;

    let totals = line_totals(
        sources,
        &order.items,
        TotalsSource::Order(&order),
        TotalsOptions::with_tax_lines(),
    )
    .await?;

    let items = order
        .items
        .iter()
        .zip(&totals)
        .map(|(item, totals)| {
            line_item_fields(item)?
                .field("totals", totals)?
                .field(
                    "discounted_price",
                    fmt.display_per_unit(totals.total, item.quantity, &currency),
                )?
                .field(
                    "price",
                    fmt.display_per_unit(totals.original_total, item.quantity, &currency),
                )
                .map(TemplateContextBuilder::build)
        })
        .collect::<Result<Vec<_>>>()?;

    let locale = sources.locale_resolver().resolve(&order).await;
    let summary = OrderSummary::from_totals(&totals);

    Ok(order_fields(&order, locale, items, &currency)?
        .field("subtotal_ex_tax", fmt.display(summary.subtotal_ex_tax, &currency))?
        .field("discounted_subtotal", summary.discounted_subtotal)?
        .field("subtotal", fmt.display(summary.subtotal, &currency))?
        .field("gift_card_total", fmt.display(order.gift_card_total, &currency))?
        .field("tax_total", fmt.display(order.tax_total.unwrap_or(0), &currency))?
        .field("discount_total", fmt.display(summary.discount_total, &currency))?
        .field("shipping_total", fmt.display(order.shipping_total, &currency))?
        .field("total", fmt.display(order.total, &currency))?
        .build())
}

/// Canceled orders are priced from the stored totals scaled by the order's
/// tax rate rather than recomputed per line.
#[tracing::instrument(skip(sources, data), fields(order_id = %data.id))]
pub async fn canceled(
    sources: &AggregateSources,
    data: &EntityEventData,
) -> Result<TemplateContext> {
    let order = sources.orders.retrieve(&data.id, &order_config()).await?;
    let currency = currency_of(&order);
    let fmt = &sources.formatter;
    let rate = order.tax_rate.unwrap_or(0.0);

    let items = order
        .items
        .iter()
        .map(|item| {
            line_item_fields(item)?
                .field("price", fmt.display(scale_by_rate(item.unit_price, rate)?, &currency))
                .map(TemplateContextBuilder::build)
        })
        .collect::<Result<Vec<_>>>()?;

    let locale = sources.locale_resolver().resolve(&order).await;
    let scaled = |amount: i64| -> Result<String> {
        Ok(fmt.display(scale_by_rate(amount, rate)?, &currency))
    };

    Ok(order_fields(&order, locale, items, &currency)?
        .field("subtotal", scaled(order.subtotal)?)?
        .field("gift_card_total", scaled(order.gift_card_total)?)?
        .field("tax_total", fmt.display(order.tax_total.unwrap_or(0), &currency))?
        .field("discount_total", scaled(order.discount_total)?)?
        .field("shipping_total", scaled(order.shipping_total)?)?
        .field("total", fmt.display(order.total, &currency))?
        .build())
}

#[tracing::instrument(
    skip(sources, data),
    fields(order_id = %data.id, fulfillment_id = %data.fulfillment_id)
)]
pub async fn shipment_created(
    sources: &AggregateSources,
    data: &ShipmentEventData,
) -> Result<TemplateContext> {
    let config = order_config().select(["refundable_amount"]);
    let order = sources.orders.retrieve(&data.id, &config).await?;
    let locale = sources.locale_resolver().resolve(&order).await;

    Ok(TemplateContext::builder()
        .field("locale", locale)?
        .field("email", &order.email)?
        .field("order", &order)?
        .build())
}
