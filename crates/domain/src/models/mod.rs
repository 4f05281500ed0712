//! Host-owned read models consumed by the enrichment pipeline.
//!
//! The pipeline only reads these; relations that were not requested from a
//! repository are simply empty or `None`.

mod catalog;
mod line_item;
mod order;
mod returns;

pub use catalog::{Cart, GiftCard, Product, ProductVariant, Region, Store};
pub use line_item::{LineItem, LineItemAdjustment, LineItemTotals, TaxLine};
pub use order::{
    Address, Customer, Discount, DiscountRule, DiscountRuleType, Fulfillment, Order, Payment,
};
pub use returns::{Claim, ReturnItem, ReturnRequest, ShippingMethod, ShippingOption, Swap};

use common::EntityId;

/// An entity that repositories can store and look up by id.
pub trait Entity {
    /// Entity kind used in error messages, e.g. `"order"`.
    const KIND: &'static str;

    /// The entity's identifier.
    fn id(&self) -> &EntityId;
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: &'static str = $kind;

                fn id(&self) -> &EntityId {
                    &self.id
                }
            }
        )*
    };
}

impl_entity! {
    Order => "order",
    LineItem => "line_item",
    ReturnRequest => "return",
    Swap => "swap",
    Claim => "claim",
    Cart => "cart",
    GiftCard => "gift_card",
    ProductVariant => "product_variant",
    Store => "store",
}
