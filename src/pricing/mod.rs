//! Pricing subsystem.
//!
//! # Data Flow
//! ```text
//! ResilientPriceClient::get_price(id)
//!     → RetryPolicy (attempt budget + backoff)
//!         → CircuitBreaker::try_acquire (or short-circuit)
//!         → PriceSource::fetch_price under a per-attempt deadline
//!         → outcome recorded on the permit
//!     → PriceQuote (genuine, or fallback once attempts are spent)
//! ```

pub mod client;
pub mod source;
pub mod types;

pub use client::ResilientPriceClient;
pub use source::{HttpPriceSource, PriceSource};
pub use types::{PriceQuote, PricingError};
