//! Lending subsystem.
//!
//! Ties the inventory row lock to the resilient pricing client. Stock changes
//! are committed before the price is looked up.

pub mod coordinator;
pub mod types;

pub use coordinator::BorrowCoordinator;
pub use types::{BorrowOutcome, LendingError, LendingResult};
