//! Book lending service library.

pub mod config;
pub mod http;
pub mod inventory;
pub mod lending;
pub mod lifecycle;
pub mod observability;
pub mod pricing;
pub mod resilience;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lending::{BorrowCoordinator, BorrowOutcome, LendingError};
pub use lifecycle::Shutdown;
