//! Locale lookup from an order's originating cart.

use std::sync::Arc;

use domain::{Cart, Order, Repository, RetrieveConfig};

/// Resolves the shopping-session locale of an order.
///
/// Resolution never fails: a missing cart or a repository error yields
/// `None` and a warning, so the notification still goes out untranslated.
#[derive(Clone)]
pub struct LocaleResolver {
    carts: Arc<dyn Repository<Cart>>,
}

impl LocaleResolver {
    pub fn new(carts: Arc<dyn Repository<Cart>>) -> Self {
        Self { carts }
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn resolve(&self, order: &Order) -> Option<String> {
        let cart_id = order.cart_id.as_ref()?;
        let config = RetrieveConfig::new().select(["id", "context"]);

        match self.carts.retrieve(cart_id, &config).await {
            Ok(cart) => cart.locale().map(str::to_string),
            Err(error) => {
                tracing::warn!(%cart_id, %error, "Failed to gather context for order");
                metrics::counter!("enrichment_locale_failures_total").increment(1);
                None
            }
        }
    }
}
