//! Inventory storage subsystem.
//!
//! # Data Flow
//! ```text
//! lock_for_update(id)
//!     → row lock acquired (other lockers of id wait)
//!     → snapshot + transaction handle returned
//!     → save(item, tx) stages the write
//!     → commit(tx) publishes it, then releases the row lock
//!        or rollback(tx) / drop(tx) discards it
//! ```
//!
//! # Design Decisions
//! - Pessimistic per-row locking; rows never contend with each other
//! - Transaction handles are RAII guards, so a lock cannot outlive its transaction
//! - Plain reads see the last committed version without taking the row lock

pub mod memory;
pub mod store;
pub mod types;

pub use memory::{InMemoryInventoryStore, MemoryTx};
pub use store::InventoryStore;
pub use types::{InventoryItem, ItemId, NewItem, StoreError, StoreResult};
