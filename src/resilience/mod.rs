//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a remote dependency:
//!     → retries.rs (attempt budget, backoff between attempts)
//!     → circuit_breaker.rs (permit or fail fast)
//!     → timeouts.rs (per-attempt deadline)
//!     → outcome recorded back into the breaker
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every remote attempt has a deadline
//! - Circuit breaker prevents piling onto a failing dependency
//! - Pieces are plain values composed by the caller, no interception

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{BreakerMetrics, CallPermit, CircuitBreaker, CircuitOpen, CircuitState};
pub use retries::{AttemptOutcome, RetryPolicy, RetryResult};
pub use timeouts::{with_deadline, DeadlineExceeded};
