use async_trait::async_trait;

use crate::inventory::types::{InventoryItem, ItemId, NewItem, StoreResult};

/// Keyed inventory storage with an exclusive read-for-update primitive.
///
/// `lock_for_update` hands back the current row together with a transaction
/// handle. Until that handle is passed to `commit` or `rollback` (or dropped,
/// which rolls back), every other `lock_for_update` on the same id waits.
/// Locks on different ids are independent.
///
/// Plain `get`/`list` read the last committed version and never wait on a
/// row lock.
#[async_trait]
pub trait InventoryStore: Send + Sync + 'static {
    /// Open transaction on a single row.
    type Tx: Send;

    async fn get(&self, id: ItemId) -> StoreResult<InventoryItem>;

    async fn list(&self) -> StoreResult<Vec<InventoryItem>>;

    async fn create(&self, item: NewItem) -> StoreResult<InventoryItem>;

    /// Lock the row for `id` and return its committed snapshot.
    async fn lock_for_update(&self, id: ItemId) -> StoreResult<(InventoryItem, Self::Tx)>;

    /// Stage a write; it becomes visible to readers only on commit.
    async fn save(&self, item: &InventoryItem, tx: &mut Self::Tx) -> StoreResult<()>;

    /// Publish the staged write and release the row lock.
    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    /// Discard the staged write and release the row lock.
    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;
}
