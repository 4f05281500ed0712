//! Domain layer for the notification pipeline.
//!
//! This crate provides:
//! - Read models of the host's aggregates (orders, swaps, returns, claims, ...)
//! - [`MoneyFormatter`] for currency-correct display strings
//! - [`Repository`] and [`TotalsCalculator`] collaborator traits
//! - In-memory repositories for tests, and PostgreSQL read-model
//!   repositories for deployments

pub mod error;
pub mod memory;
pub mod models;
pub mod money;
pub mod postgres;
pub mod repository;
pub mod totals;

pub use error::DomainError;
pub use memory::{InMemoryRepository, InMemoryStoreService};
pub use models::{
    Address, Cart, Claim, Customer, Discount, DiscountRule, DiscountRuleType, Entity, Fulfillment,
    GiftCard, LineItem, LineItemAdjustment, LineItemTotals, Order, Payment, Product,
    ProductVariant, Region, ReturnItem, ReturnRequest, ShippingMethod, ShippingOption, Store,
    Swap, TaxLine,
};
pub use money::{CurrencyCode, MoneyFormatter, ZERO_DECIMAL_CURRENCIES};
pub use postgres::{PostgresRepository, PostgresStoreService};
pub use repository::{Repository, RetrieveConfig, StoreService};
pub use totals::{StandardTotalsCalculator, TotalsCalculator, TotalsOptions, TotalsSource};
