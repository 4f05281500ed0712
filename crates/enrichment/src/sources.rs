//! The host collaborators fetchers read aggregates from.

use std::sync::Arc;

use domain::{
    Cart, Claim, GiftCard, InMemoryRepository, InMemoryStoreService, LineItem,
    MoneyFormatter, Order, PostgresRepository, PostgresStoreService, ProductVariant, Repository,
    ReturnRequest, StandardTotalsCalculator, StoreService, Swap, TotalsCalculator,
};
use sqlx::PgPool;

use crate::locale::LocaleResolver;

/// Read-only access to every aggregate a fetcher may need.
///
/// Cloning is cheap; all collaborators are shared.
#[derive(Clone)]
pub struct AggregateSources {
    pub orders: Arc<dyn Repository<Order>>,
    pub line_items: Arc<dyn Repository<LineItem>>,
    pub returns: Arc<dyn Repository<ReturnRequest>>,
    pub swaps: Arc<dyn Repository<Swap>>,
    pub claims: Arc<dyn Repository<Claim>>,
    pub carts: Arc<dyn Repository<Cart>>,
    pub gift_cards: Arc<dyn Repository<GiftCard>>,
    pub variants: Arc<dyn Repository<ProductVariant>>,
    pub store: Arc<dyn StoreService>,
    pub totals: Arc<dyn TotalsCalculator>,
    pub formatter: MoneyFormatter,
}

impl AggregateSources {
    /// Wires every source to an empty in-memory repository.
    pub fn in_memory() -> Self {
        Self::from_memory(&InMemorySources::default())
    }

    /// Wires every source to the given in-memory repositories.
    pub fn from_memory(memory: &InMemorySources) -> Self {
        Self {
            orders: Arc::new(memory.orders.clone()),
            line_items: Arc::new(memory.line_items.clone()),
            returns: Arc::new(memory.returns.clone()),
            swaps: Arc::new(memory.swaps.clone()),
            claims: Arc::new(memory.claims.clone()),
            carts: Arc::new(memory.carts.clone()),
            gift_cards: Arc::new(memory.gift_cards.clone()),
            variants: Arc::new(memory.variants.clone()),
            store: Arc::new(memory.store.clone()),
            totals: Arc::new(StandardTotalsCalculator::new()),
            formatter: MoneyFormatter::new(),
        }
    }

    /// Wires every source to the host's read models in PostgreSQL.
    pub fn from_postgres(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PostgresRepository::<Order>::new(pool.clone())),
            line_items: Arc::new(PostgresRepository::<LineItem>::new(pool.clone())),
            returns: Arc::new(PostgresRepository::<ReturnRequest>::new(pool.clone())),
            swaps: Arc::new(PostgresRepository::<Swap>::new(pool.clone())),
            claims: Arc::new(PostgresRepository::<Claim>::new(pool.clone())),
            carts: Arc::new(PostgresRepository::<Cart>::new(pool.clone())),
            gift_cards: Arc::new(PostgresRepository::<GiftCard>::new(pool.clone())),
            variants: Arc::new(PostgresRepository::<ProductVariant>::new(pool.clone())),
            store: Arc::new(PostgresStoreService::new(pool)),
            totals: Arc::new(StandardTotalsCalculator::new()),
            formatter: MoneyFormatter::new(),
        }
    }

    pub fn locale_resolver(&self) -> LocaleResolver {
        LocaleResolver::new(Arc::clone(&self.carts))
    }
}

/// Handles on the in-memory repositories behind [`AggregateSources::from_memory`].
///
/// Tests keep this around to seed aggregates after wiring.
#[derive(Clone, Default)]
pub struct InMemorySources {
    pub orders: InMemoryRepository<Order>,
    pub line_items: InMemoryRepository<LineItem>,
    pub returns: InMemoryRepository<ReturnRequest>,
    pub swaps: InMemoryRepository<Swap>,
    pub claims: InMemoryRepository<Claim>,
    pub carts: InMemoryRepository<Cart>,
    pub gift_cards: InMemoryRepository<GiftCard>,
    pub variants: InMemoryRepository<ProductVariant>,
    pub store: InMemoryStoreService,
}
