//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay schedule between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_ms: u64,
    max_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    ///
    /// Doubles per attempt from `base_ms`, capped at `max_ms`, plus up to 10% jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let capped_delay = self.capped_ms(attempt);
        let jitter_range = capped_delay / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped_delay + jitter)
    }

    /// Upper bound of [`delay_after`](Self::delay_after), jitter included.
    pub fn max_delay_after(&self, attempt: u32) -> Duration {
        let capped_delay = self.capped_ms(attempt);
        Duration::from_millis(capped_delay + capped_delay / 10)
    }

    fn capped_ms(&self, attempt: u32) -> u64 {
        if attempt == 0 || self.base_ms == 0 {
            return 0;
        }
        let exponential_base = 2u64.saturating_pow(attempt - 1);
        self.base_ms.saturating_mul(exponential_base).min(self.max_ms)
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }
}
