//! Startup orchestration.
//!
//! Subsystems initialize in dependency order: store and seed data, then the
//! pricing client and its breaker, then the coordinator. Listeners start last,
//! in `main`.

use std::sync::Arc;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::inventory::{InMemoryInventoryStore, InventoryStore, NewItem, StoreError};
use crate::lending::BorrowCoordinator;
use crate::pricing::{HttpPriceSource, PricingError, ResilientPriceClient};
use crate::resilience::CircuitBreaker;

/// Name of the breaker guarding the pricing dependency.
pub const PRICING_BREAKER: &str = "pricing";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("pricing client: {0}")]
    Pricing(#[from] PricingError),

    #[error("seeding inventory: {0}")]
    Seed(#[from] StoreError),
}

/// Build the coordinator described by a validated `config`.
pub async fn build_coordinator(
    config: &ServiceConfig,
) -> Result<BorrowCoordinator<InMemoryInventoryStore, HttpPriceSource>, StartupError> {
    let store = Arc::new(InMemoryInventoryStore::new());
    for seed in &config.seed {
        let item = store
            .create(NewItem {
                title: seed.title.clone(),
                author: seed.author.clone(),
                stock: seed.stock,
            })
            .await?;
        tracing::debug!(item_id = %item.id, title = %item.title, stock = item.stock, "Seeded item");
    }
    tracing::info!(items = store.len(), "Inventory ready");

    let source = HttpPriceSource::new(&config.pricing.base_url)?;
    let breaker = Arc::new(CircuitBreaker::new(PRICING_BREAKER, &config.circuit_breaker));
    let pricing = ResilientPriceClient::new(source, breaker, &config.pricing, &config.retries);

    Ok(BorrowCoordinator::new(
        store,
        Arc::new(pricing),
        config.instance_name.clone(),
    ))
}
