//! Inventory record types and store errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of an inventory item, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lendable item and its remaining stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub title: String,
    pub author: String,
    pub stock: u32,
}

/// Payload for registering a new item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub stock: u32,
}

/// Errors that can occur in the inventory store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No item has the requested id.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// A write targeted a row other than the one the transaction locked.
    #[error("transaction holds item {locked}, cannot write item {attempted}")]
    WrongRow { locked: ItemId, attempted: ItemId },

    /// The committed-state lock was poisoned by a panicking writer.
    #[error("store poisoned: {0}")]
    Poisoned(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
