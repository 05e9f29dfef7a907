//! In-memory inventory store with per-row exclusive locks.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::inventory::store::InventoryStore;
use crate::inventory::types::{InventoryItem, ItemId, NewItem, StoreError, StoreResult};

/// One stored record: the row lock plus the last committed version.
#[derive(Debug)]
struct Row {
    lock: Arc<Mutex<()>>,
    committed: RwLock<InventoryItem>,
}

impl Row {
    fn new(item: InventoryItem) -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            committed: RwLock::new(item),
        }
    }

    fn snapshot(&self) -> StoreResult<InventoryItem> {
        self.committed
            .read()
            .map(|item| item.clone())
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

/// Transaction handle for [`InMemoryInventoryStore`].
///
/// Holds the row lock for its whole lifetime. Dropping it without calling
/// `commit` discards the staged write.
#[derive(Debug)]
pub struct MemoryTx {
    id: ItemId,
    row: Arc<Row>,
    staged: Option<InventoryItem>,
    _guard: OwnedMutexGuard<()>,
}

impl MemoryTx {
    /// Id of the locked row.
    pub fn item_id(&self) -> ItemId {
        self.id
    }
}

/// A thread-safe inventory store kept in memory.
///
/// Rows live in a `DashMap`; the map's shard locks are only held for lookups,
/// never across an `.await`, so contention is limited to the row lock itself.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    rows: DashMap<ItemId, Arc<Row>>,
    next_id: AtomicU64,
}

impl InMemoryInventoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no item has been registered.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, id: ItemId) -> StoreResult<Arc<Row>> {
        self.rows
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    type Tx = MemoryTx;

    async fn get(&self, id: ItemId) -> StoreResult<InventoryItem> {
        self.row(id)?.snapshot()
    }

    async fn list(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows: Vec<Arc<Row>> = self.rows.iter().map(|r| r.value().clone()).collect();
        let mut items = rows
            .iter()
            .map(|row| row.snapshot())
            .collect::<StoreResult<Vec<_>>>()?;
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn create(&self, item: NewItem) -> StoreResult<InventoryItem> {
        let id = ItemId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let created = InventoryItem {
            id,
            title: item.title,
            author: item.author,
            stock: item.stock,
        };
        self.rows.insert(id, Arc::new(Row::new(created.clone())));
        tracing::debug!(item_id = %id, title = %created.title, "Item created");
        Ok(created)
    }

    async fn lock_for_update(&self, id: ItemId) -> StoreResult<(InventoryItem, MemoryTx)> {
        let row = self.row(id)?;
        let guard = row.lock.clone().lock_owned().await;
        let snapshot = row.snapshot()?;

        Ok((
            snapshot,
            MemoryTx {
                id,
                row,
                staged: None,
                _guard: guard,
            },
        ))
    }

    async fn save(&self, item: &InventoryItem, tx: &mut MemoryTx) -> StoreResult<()> {
        if item.id != tx.id {
            return Err(StoreError::WrongRow {
                locked: tx.id,
                attempted: item.id,
            });
        }
        tx.staged = Some(item.clone());
        Ok(())
    }

    async fn commit(&self, mut tx: MemoryTx) -> StoreResult<()> {
        if let Some(item) = tx.staged.take() {
            let mut committed = tx
                .row
                .committed
                .write()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            *committed = item;
        }
        // Row lock is released when `tx` drops, after the write is published.
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn book(title: &str, stock: u32) -> NewItem {
        NewItem {
            title: title.to_string(),
            author: "Anonymous".to_string(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryInventoryStore::new();
        let a = store.create(book("A", 1)).await.unwrap();
        let b = store.create(book("B", 2)).await.unwrap();

        assert_eq!(a.id, ItemId(1));
        assert_eq!(b.id, ItemId(2));
        assert_eq!(store.len(), 2);

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![a, b]);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = InMemoryInventoryStore::new();
        assert_eq!(store.get(ItemId(42)).await, Err(StoreError::NotFound(ItemId(42))));
        assert!(matches!(
            store.lock_for_update(ItemId(42)).await,
            Err(StoreError::NotFound(ItemId(42)))
        ));
    }

    #[tokio::test]
    async fn test_same_row_lock_is_exclusive() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let item = store.create(book("A", 3)).await.unwrap();

        let (mut snapshot, mut tx) = store.lock_for_update(item.id).await.unwrap();

        // A second locker must wait while the first transaction is open.
        let blocked = timeout(Duration::from_millis(50), store.lock_for_update(item.id)).await;
        assert!(blocked.is_err());

        snapshot.stock -= 1;
        store.save(&snapshot, &mut tx).await.unwrap();
        store.commit(tx).await.unwrap();

        let (after, tx2) = timeout(Duration::from_millis(50), store.lock_for_update(item.id))
            .await
            .expect("lock should be free after commit")
            .unwrap();
        assert_eq!(after.stock, 2);
        store.rollback(tx2).await.unwrap();
    }

    #[tokio::test]
    async fn test_different_rows_do_not_block() {
        let store = InMemoryInventoryStore::new();
        let a = store.create(book("A", 1)).await.unwrap();
        let b = store.create(book("B", 1)).await.unwrap();

        let (_, tx_a) = store.lock_for_update(a.id).await.unwrap();
        let locked_b = timeout(Duration::from_millis(50), store.lock_for_update(b.id)).await;
        assert!(locked_b.is_ok());

        drop(locked_b);
        drop(tx_a);
    }

    #[tokio::test]
    async fn test_staged_write_invisible_until_commit() {
        let store = InMemoryInventoryStore::new();
        let item = store.create(book("A", 5)).await.unwrap();

        let (mut snapshot, mut tx) = store.lock_for_update(item.id).await.unwrap();
        snapshot.stock = 0;
        store.save(&snapshot, &mut tx).await.unwrap();

        // Plain reads do not wait on the row lock and see the committed version.
        let read = timeout(Duration::from_millis(50), store.get(item.id))
            .await
            .expect("plain get must not block")
            .unwrap();
        assert_eq!(read.stock, 5);

        store.commit(tx).await.unwrap();
        assert_eq!(store.get(item.id).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = InMemoryInventoryStore::new();
        let item = store.create(book("A", 5)).await.unwrap();

        let (mut snapshot, mut tx) = store.lock_for_update(item.id).await.unwrap();
        snapshot.stock = 1;
        store.save(&snapshot, &mut tx).await.unwrap();
        store.rollback(tx).await.unwrap();
        assert_eq!(store.get(item.id).await.unwrap().stock, 5);

        let (mut snapshot, mut tx) = store.lock_for_update(item.id).await.unwrap();
        snapshot.stock = 2;
        store.save(&snapshot, &mut tx).await.unwrap();
        drop(tx);
        assert_eq!(store.get(item.id).await.unwrap().stock, 5);

        // The dropped transaction released its lock.
        let relocked = timeout(Duration::from_millis(50), store.lock_for_update(item.id)).await;
        assert!(relocked.is_ok());
    }

    #[tokio::test]
    async fn test_save_rejects_other_row() {
        let store = InMemoryInventoryStore::new();
        let a = store.create(book("A", 1)).await.unwrap();
        let b = store.create(book("B", 1)).await.unwrap();

        let (_, mut tx) = store.lock_for_update(a.id).await.unwrap();
        assert_eq!(tx.item_id(), a.id);
        let err = store.save(&b, &mut tx).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::WrongRow {
                locked: a.id,
                attempted: b.id
            }
        );
    }
}
