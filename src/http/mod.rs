//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, per-request span)
//!     → handlers.rs (JSON in/out, LendingError → status)
//!     → BorrowCoordinator
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
