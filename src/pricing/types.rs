//! Pricing types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::resilience::DeadlineExceeded;

/// A price for one borrow, either quoted by the pricing service or substituted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price value; never negative.
    pub value: f64,
    /// True when `value` is the configured default rather than a real quote.
    pub is_fallback: bool,
}

impl PriceQuote {
    /// A price returned by the pricing service.
    pub fn genuine(value: f64) -> Self {
        Self {
            value,
            is_fallback: false,
        }
    }

    /// The default price used when the pricing service is unavailable.
    pub fn fallback(value: f64) -> Self {
        Self {
            value,
            is_fallback: true,
        }
    }
}

/// Failure of a single pricing call. Every variant is retriable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Connection or request failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response.
    #[error("pricing service returned status {0}")]
    Status(u16),

    /// Response body was not a usable price.
    #[error("malformed price response: {0}")]
    Malformed(String),

    /// Per-attempt deadline elapsed.
    #[error("pricing call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<DeadlineExceeded> for PricingError {
    fn from(e: DeadlineExceeded) -> Self {
        PricingError::Timeout(e.0)
    }
}

impl PricingError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::Transport(_) => "transport",
            PricingError::Status(_) => "status",
            PricingError::Malformed(_) => "malformed",
            PricingError::Timeout(_) => "timeout",
        }
    }
}
