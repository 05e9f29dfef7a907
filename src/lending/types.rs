//! Borrow results and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inventory::{ItemId, StoreError};

/// Result of a successful borrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowOutcome {
    #[serde(rename = "bookId")]
    pub item_id: ItemId,
    pub title: String,
    pub stock_left: u32,
    pub price: f64,
    /// Forwarded from the quote: the price is a default, not a real quote.
    pub pricing_fallback: bool,
    pub instance: String,
    pub message: String,
}

/// Errors surfaced by the lending operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LendingError {
    #[error("Book with id {0} not found")]
    NotFound(ItemId),

    #[error("Book with id {0} is out of stock")]
    OutOfStock(ItemId),

    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("inventory store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LendingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => LendingError::NotFound(id),
            other => LendingError::Store(other),
        }
    }
}

/// Result type for lending operations.
pub type LendingResult<T> = Result<T, LendingError>;
