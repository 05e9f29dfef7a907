//! Borrow orchestration.
//!
//! # Borrow sequence
//! ```text
//! lock_for_update(id)        ── NotFound
//!   stock == 0 → rollback    ── OutOfStock
//!   stock -= 1, save, commit (row lock released here)
//! get_price(id)              ── never fails; fallback on dependency trouble
//! BorrowOutcome
//! ```
//!
//! The price lookup runs after commit, so a slow pricing service never holds
//! the row lock.

use std::sync::Arc;

use crate::inventory::{InventoryItem, InventoryStore, ItemId, NewItem, StoreError};
use crate::lending::types::{BorrowOutcome, LendingError, LendingResult};
use crate::observability::metrics;
use crate::pricing::{PriceSource, ResilientPriceClient};

const BORROWED_MESSAGE: &str = "Book borrowed successfully";

/// Coordinates borrows against an inventory store and the pricing client.
pub struct BorrowCoordinator<S, P> {
    store: Arc<S>,
    pricing: Arc<ResilientPriceClient<P>>,
    instance: String,
}

impl<S, P> Clone for BorrowCoordinator<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            pricing: self.pricing.clone(),
            instance: self.instance.clone(),
        }
    }
}

impl<S: InventoryStore, P: PriceSource> BorrowCoordinator<S, P> {
    pub fn new(
        store: Arc<S>,
        pricing: Arc<ResilientPriceClient<P>>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            store,
            pricing,
            instance: instance.into(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn pricing(&self) -> &Arc<ResilientPriceClient<P>> {
        &self.pricing
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Borrow one unit of `id`.
    pub async fn borrow(&self, id: ItemId) -> LendingResult<BorrowOutcome> {
        tracing::info!(instance = %self.instance, item_id = %id, "Attempting to borrow item");

        let (mut item, mut tx) = match self.store.lock_for_update(id).await {
            Ok(locked) => locked,
            Err(e) => {
                metrics::record_borrow(lock_failure_outcome(&e));
                return Err(e.into());
            }
        };
        tracing::debug!(item_id = %id, title = %item.title, stock = item.stock, "Got lock on item");

        if item.stock == 0 {
            self.store.rollback(tx).await?;
            tracing::warn!(instance = %self.instance, item_id = %id, "Item is out of stock");
            metrics::record_borrow("out_of_stock");
            return Err(LendingError::OutOfStock(id));
        }

        item.stock -= 1;
        self.store.save(&item, &mut tx).await?;
        self.store.commit(tx).await?;

        tracing::info!(
            instance = %self.instance,
            item_id = %id,
            title = %item.title,
            stock_left = item.stock,
            "Borrowed item"
        );

        let quote = self.pricing.get_price(id).await;
        metrics::record_borrow("success");

        Ok(BorrowOutcome {
            item_id: id,
            title: item.title,
            stock_left: item.stock,
            price: quote.value,
            pricing_fallback: quote.is_fallback,
            instance: self.instance.clone(),
            message: BORROWED_MESSAGE.to_string(),
        })
    }

    /// Overwrite the stock of `id` under the row lock.
    pub async fn reset_stock(&self, id: ItemId, new_stock: u32) -> LendingResult<InventoryItem> {
        let (mut item, mut tx) = self.store.lock_for_update(id).await?;
        let previous = item.stock;

        item.stock = new_stock;
        self.store.save(&item, &mut tx).await?;
        self.store.commit(tx).await?;

        tracing::info!(item_id = %id, previous, stock = new_stock, "Stock reset");
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> LendingResult<InventoryItem> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list_items(&self) -> LendingResult<Vec<InventoryItem>> {
        Ok(self.store.list().await?)
    }

    pub async fn create_item(&self, item: NewItem) -> LendingResult<InventoryItem> {
        if item.title.trim().is_empty() {
            return Err(LendingError::InvalidItem("title must not be empty".to_string()));
        }
        let created = self.store.create(item).await?;
        tracing::info!(item_id = %created.id, title = %created.title, stock = created.stock, "Created item");
        Ok(created)
    }
}

/// Metric label for a borrow that could not take the row lock.
fn lock_failure_outcome(error: &StoreError) -> &'static str {
    match error {
        StoreError::NotFound(_) => "not_found",
        _ => "store_error",
    }
}
