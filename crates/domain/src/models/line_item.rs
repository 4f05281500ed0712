use common::EntityId;
use serde::{Deserialize, Serialize};

/// A tax line attached to a line item or shipping method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    /// Percentage rate, e.g. `25.0`. Hosts may leave it unset.
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl TaxLine {
    /// Creates a named tax line with a rate.
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        Self {
            rate: Some(rate),
            name: name.into(),
            code: None,
        }
    }

    /// Returns the rate, treating an unset rate as zero.
    pub fn rate_or_zero(&self) -> f64 {
        self.rate.unwrap_or(0.0)
    }
}

/// Discount amount allocated to a line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemAdjustment {
    #[serde(default)]
    pub discount_id: Option<EntityId>,
    #[serde(default)]
    pub description: String,
    pub amount: i64,
}

/// A line of an order, cart or swap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Price per unit in minor units.
    pub unit_price: i64,
    pub quantity: u32,
    #[serde(default)]
    pub variant_id: Option<EntityId>,
    /// Set on swap cart lines that represent returned goods.
    #[serde(default)]
    pub is_return: bool,
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
    #[serde(default)]
    pub adjustments: Vec<LineItemAdjustment>,
}

impl LineItem {
    /// Creates a line item with the given price and quantity.
    pub fn new(
        id: impl Into<EntityId>,
        title: impl Into<String>,
        unit_price: i64,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            unit_price,
            quantity,
            ..Default::default()
        }
    }

    /// Adds a tax line.
    pub fn with_tax_line(mut self, tax_line: TaxLine) -> Self {
        self.tax_lines.push(tax_line);
        self
    }

    /// Adds a discount adjustment.
    pub fn with_adjustment(mut self, amount: i64) -> Self {
        self.adjustments.push(LineItemAdjustment {
            amount,
            ..Default::default()
        });
        self
    }

    /// Sets the variant id.
    pub fn with_variant(mut self, variant_id: impl Into<EntityId>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    /// Marks the line as a returned item.
    pub fn returned(mut self) -> Self {
        self.is_return = true;
        self
    }

    /// Sum of all discount adjustments on this line.
    pub fn adjustment_total(&self) -> i64 {
        self.adjustments.iter().map(|a| a.amount).sum()
    }
}

/// Derived totals of a single line item, as computed by a totals calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemTotals {
    pub unit_price: i64,
    pub quantity: u32,
    /// `unit_price * quantity`, before discounts and tax.
    pub subtotal: i64,
    /// Tax on the discounted subtotal.
    pub tax_total: i64,
    /// Discounted subtotal plus tax.
    pub total: i64,
    /// Undiscounted subtotal plus tax.
    pub original_total: i64,
    /// Tax on the undiscounted subtotal.
    pub original_tax_total: i64,
    pub discount_total: i64,
    pub tax_lines: Vec<TaxLine>,
}
