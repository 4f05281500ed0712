//! Totals calculation seam and a reference implementation.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::models::{Cart, LineItem, LineItemTotals, Order};
use crate::money::percentage_of;

/// Options for [`TotalsCalculator::line_item_totals`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalsOptions {
    /// Compute tax amounts; otherwise all tax figures are zero.
    pub include_tax: bool,
    /// Only use the line's own tax lines, never the source's fallback rate.
    pub use_tax_lines: bool,
}

impl TotalsOptions {
    /// Tax included, falling back to the source rate for untaxed lines.
    pub fn with_tax() -> Self {
        Self {
            include_tax: true,
            use_tax_lines: false,
        }
    }

    /// Tax included, computed strictly from the line's tax lines.
    pub fn with_tax_lines() -> Self {
        Self {
            include_tax: true,
            use_tax_lines: true,
        }
    }
}

/// The aggregate a line item is priced against.
#[derive(Debug, Clone, Copy)]
pub enum TotalsSource<'a> {
    Order(&'a Order),
    Cart(&'a Cart),
}

impl TotalsSource<'_> {
    /// Fallback tax rate (percentage) for lines without tax lines.
    pub fn tax_rate(&self) -> Option<f64> {
        match self {
            TotalsSource::Order(order) => order
                .tax_rate
                .or_else(|| order.region.as_ref().and_then(|r| r.tax_rate)),
            TotalsSource::Cart(cart) => cart.region.as_ref().and_then(|r| r.tax_rate),
        }
    }
}

/// Computes derived totals for line items and orders.
#[async_trait]
pub trait TotalsCalculator: Send + Sync {
    /// Totals of one line item priced against `source`.
    async fn line_item_totals(
        &self,
        item: &LineItem,
        source: TotalsSource<'_>,
        options: TotalsOptions,
    ) -> Result<LineItemTotals, DomainError>;

    /// Amount refunded when `items` are returned from `order`.
    async fn refund_total(&self, order: &Order, items: &[LineItem]) -> Result<i64, DomainError>;

    /// Grand total of an order: its items plus taxed shipping.
    async fn order_total(&self, order: &Order) -> Result<i64, DomainError>;
}

/// Reference totals calculator.
///
/// * `subtotal = unit_price * quantity`
/// * discounts come from the line's adjustments, capped at the subtotal
/// * tax is rounded per tax line
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTotalsCalculator;

impl StandardTotalsCalculator {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self
    }

    fn rates(item: &LineItem, source: TotalsSource<'_>, options: TotalsOptions) -> Vec<f64> {
        if options.use_tax_lines || !item.tax_lines.is_empty() {
            item.tax_lines.iter().map(|t| t.rate_or_zero()).collect()
        } else {
            source.tax_rate().into_iter().collect()
        }
    }

    fn compute(item: &LineItem, source: TotalsSource<'_>, options: TotalsOptions) -> LineItemTotals {
        let subtotal = item.unit_price * i64::from(item.quantity);
        let discount_total = item.adjustment_total().clamp(0, subtotal.max(0));
        let discounted = subtotal - discount_total;

        let (tax_total, original_tax_total) = if options.include_tax {
            Self::rates(item, source, options)
                .into_iter()
                .fold((0, 0), |(tax, original), rate| {
                    (
                        tax + percentage_of(discounted, rate),
                        original + percentage_of(subtotal, rate),
                    )
                })
        } else {
            (0, 0)
        };

        LineItemTotals {
            unit_price: item.unit_price,
            quantity: item.quantity,
            subtotal,
            tax_total,
            total: discounted + tax_total,
            original_total: subtotal + original_tax_total,
            original_tax_total,
            discount_total,
            tax_lines: item.tax_lines.clone(),
        }
    }
}

#[async_trait]
impl TotalsCalculator for StandardTotalsCalculator {
    async fn line_item_totals(
        &self,
        item: &LineItem,
        source: TotalsSource<'_>,
        options: TotalsOptions,
    ) -> Result<LineItemTotals, DomainError> {
        Ok(Self::compute(item, source, options))
    }

    async fn refund_total(&self, order: &Order, items: &[LineItem]) -> Result<i64, DomainError> {
        Ok(items
            .iter()
            .map(|item| {
                Self::compute(item, TotalsSource::Order(order), TotalsOptions::with_tax_lines())
                    .total
            })
            .sum())
    }

    async fn order_total(&self, order: &Order) -> Result<i64, DomainError> {
        let items: i64 = order
            .items
            .iter()
            .map(|item| Self::compute(item, TotalsSource::Order(order), TotalsOptions::with_tax()).total)
            .sum();

        let shipping: i64 = order
            .shipping_methods
            .iter()
            .map(|method| {
                method.price
                    + method
                        .tax_lines
                        .iter()
                        .map(|t| percentage_of(method.price, t.rate_or_zero()))
                        .sum::<i64>()
            })
            .sum();

        Ok(items + shipping)
    }
}
