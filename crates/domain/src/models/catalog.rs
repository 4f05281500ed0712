use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::line_item::LineItem;
use super::order::Order;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub currency_code: String,
    /// Percentage rate, e.g. `25.0`.
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftCard {
    pub id: EntityId,
    pub code: String,
    /// Face value in minor units, excluding tax.
    pub value: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub order_id: Option<EntityId>,
    #[serde(default)]
    pub order: Option<Box<Order>>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_quantity: i64,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Store-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Link template for swap confirmation, with a `{cart_id}` placeholder.
    #[serde(default)]
    pub swap_link_template: Option<String>,
}

/// A shopping session. Only its context and, for swaps, its items are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: EntityId,
    /// Free-form session context; may carry a `locale` string.
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub subtotal: i64,
    #[serde(default)]
    pub tax_total: Option<i64>,
    #[serde(default)]
    pub discount_total: i64,
    #[serde(default)]
    pub shipping_total: i64,
    #[serde(default)]
    pub total: Option<i64>,
}

impl Cart {
    /// Returns the session locale, if the context carries a string one.
    pub fn locale(&self) -> Option<&str> {
        self.context.get("locale").and_then(Value::as_str)
    }
}
