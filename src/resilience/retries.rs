//! Retry logic.
//!
//! # Responsibilities
//! - Bound the number of attempts per call
//! - Sleep with exponential backoff + jitter between attempts
//! - Stop immediately when the circuit breaker short-circuits an attempt
//!
//! # Design Decisions
//! - Attempts report explicit outcome values; the loop is plain control flow
//! - A short-circuited attempt counts toward the budget and ends the loop
//!   without any backoff

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::BackoffPolicy;

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T, E> {
    /// The call succeeded.
    Success(T),
    /// The call failed in a way worth retrying.
    Retriable(E),
    /// The call was rejected without reaching the dependency.
    ShortCircuited,
}

/// Final result of a retried call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryResult<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { last_error: E, attempts: u32 },
    ShortCircuited { attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    /// Number of attempts made, short-circuited ones included.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryResult::Succeeded { attempts, .. }
            | RetryResult::Exhausted { attempts, .. }
            | RetryResult::ShortCircuited { attempts } => *attempts,
        }
    }
}

/// Attempt budget and delay schedule.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Longest a call can take when every attempt runs to `attempt_timeout`.
    pub fn worst_case_duration(&self, attempt_timeout: Duration) -> Duration {
        let backoff: Duration = (1..self.max_attempts)
            .map(|attempt| self.backoff.max_delay_after(attempt))
            .sum();
        attempt_timeout.saturating_mul(self.max_attempts) + backoff
    }

    /// Run `op` until it succeeds, short-circuits, or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryResult<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                AttemptOutcome::Success(value) => {
                    return RetryResult::Succeeded { value, attempts: attempt };
                }
                AttemptOutcome::ShortCircuited => {
                    return RetryResult::ShortCircuited { attempts: attempt };
                }
                AttemptOutcome::Retriable(error) => {
                    if attempt >= self.max_attempts {
                        return RetryResult::Exhausted {
                            last_error: error,
                            attempts: attempt,
                        };
                    }
                    let delay = self.backoff.delay_after(attempt);
                    tracing::debug!(attempt, delay = ?delay, "Retrying after failure");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, BackoffPolicy::from(config))
    }
}
