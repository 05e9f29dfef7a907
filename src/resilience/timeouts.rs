//! Timeout enforcement.
//!
//! Every remote attempt runs under its own deadline. An elapsed deadline
//! surfaces as [`DeadlineExceeded`], converted into the caller's error type.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The per-attempt deadline elapsed before the call completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run a fallible future under a deadline.
pub async fn with_deadline<T, E, F>(deadline: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(E::from(DeadlineExceeded(deadline))),
    }
}
