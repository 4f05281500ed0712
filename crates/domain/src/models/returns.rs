use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::line_item::{LineItem, TaxLine};
use super::order::{Address, Order};

/// The shipping option a shipping method was created from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Fulfillment provider that handles this option.
    pub provider_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: EntityId,
    /// Base price in minor units, before tax.
    pub price: i64,
    #[serde(default)]
    pub shipping_option: Option<ShippingOption>,
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
    /// Provider-specific data; opaque to the pipeline.
    #[serde(default)]
    pub data: Value,
}

/// A returned line, referencing the original line item by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub item_id: EntityId,
    pub quantity: u32,
    /// Populated when the repository loaded the `items.item` relation.
    #[serde(default)]
    pub item: Option<LineItem>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: EntityId,
    #[serde(default)]
    pub order_id: Option<EntityId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<ReturnItem>,
    #[serde(default)]
    pub shipping_method: Option<ShippingMethod>,
    /// Provider-specific data used to fetch return labels.
    #[serde(default)]
    pub shipping_data: Value,
    #[serde(default)]
    pub refund_amount: i64,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub id: EntityId,
    pub order_id: EntityId,
    #[serde(default)]
    pub cart_id: Option<EntityId>,
    /// Amount the customer pays (positive) or is refunded (negative).
    #[serde(default)]
    pub difference_due: i64,
    #[serde(default)]
    pub additional_items: Vec<LineItem>,
    #[serde(default)]
    pub return_order: Option<ReturnRequest>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: EntityId,
    pub order_id: EntityId,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub order: Option<Box<Order>>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}
