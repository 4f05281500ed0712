use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};

use super::catalog::{GiftCard, Region};
use super::line_item::LineItem;
use super::returns::{ReturnRequest, ShippingMethod};

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address_1: Option<String>,
    #[serde(default)]
    pub address_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// How a discount rule's `value` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRuleType {
    /// `value` is a percentage.
    Percentage,
    /// `value` is an amount in the order currency.
    #[default]
    Fixed,
    FreeShipping,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    #[serde(rename = "type")]
    pub kind: DiscountRuleType,
    pub value: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: EntityId,
    pub code: String,
    pub rule: DiscountRule,
}

impl Discount {
    /// Creates a discount with a rule.
    pub fn new(
        id: impl Into<EntityId>,
        code: impl Into<String>,
        kind: DiscountRuleType,
        value: i64,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            rule: DiscountRule {
                kind,
                value,
                description: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: EntityId,
    pub amount: i64,
    pub currency_code: String,
    #[serde(default)]
    pub provider_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub id: EntityId,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub tracking_numbers: Vec<String>,
    #[serde(default)]
    pub shipped_at: Option<DateTime<Utc>>,
}

/// An order with whichever relations the repository loaded.
///
/// The stored totals (`subtotal`, `tax_total`, ...) are the host's own
/// figures; fetchers that need tax-inclusive per-line numbers recompute them
/// through a totals calculator instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    #[serde(default)]
    pub display_id: Option<i64>,
    pub email: String,
    pub currency_code: String,
    /// Cart the order was placed from; carries the shopping-session context.
    #[serde(default)]
    pub cart_id: Option<EntityId>,
    /// Order-level tax rate as stored by the host.
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    #[serde(default)]
    pub gift_cards: Vec<GiftCard>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub fulfillments: Vec<Fulfillment>,
    #[serde(default)]
    pub returns: Vec<ReturnRequest>,
    #[serde(default)]
    pub subtotal: i64,
    #[serde(default)]
    pub tax_total: Option<i64>,
    #[serde(default)]
    pub discount_total: i64,
    #[serde(default)]
    pub shipping_total: i64,
    #[serde(default)]
    pub gift_card_total: i64,
    #[serde(default)]
    pub refunded_total: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub refundable_amount: Option<i64>,
}

impl Order {
    /// Creates an order with no relations loaded.
    pub fn new(
        id: impl Into<EntityId>,
        email: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            currency_code: currency_code.into(),
            ..Default::default()
        }
    }
}
