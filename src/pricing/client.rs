//! Resilient pricing client.
//!
//! Composition: `Retry(CircuitBreaker(Deadline(RemoteCall)))`, with a fallback
//! quote when no attempt succeeds. `get_price` never fails.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PricingConfig, RetryConfig};
use crate::inventory::ItemId;
use crate::observability::metrics;
use crate::pricing::source::PriceSource;
use crate::pricing::types::{PriceQuote, PricingError};
use crate::resilience::{with_deadline, AttemptOutcome, CircuitBreaker, RetryPolicy, RetryResult};

/// Pricing client that trades accuracy for availability.
#[derive(Debug)]
pub struct ResilientPriceClient<P> {
    source: P,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    fallback_price: f64,
}

impl<P: PriceSource> ResilientPriceClient<P> {
    /// Wrap `source` with the given shared breaker and policy settings.
    pub fn new(
        source: P,
        breaker: Arc<CircuitBreaker>,
        pricing: &PricingConfig,
        retries: &RetryConfig,
    ) -> Self {
        Self {
            source,
            breaker,
            retry: RetryPolicy::from(retries),
            attempt_timeout: Duration::from_millis(pricing.timeout_ms),
            fallback_price: pricing.fallback_price,
        }
    }

    /// The breaker guarding the pricing dependency.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Quote a price for `id`, substituting the fallback price on failure.
    pub async fn get_price(&self, id: ItemId) -> PriceQuote {
        let result = self.retry.run(move |attempt| self.attempt(id, attempt)).await;

        match result {
            RetryResult::Succeeded { value, attempts } => {
                tracing::debug!(item_id = %id, price = value, attempts, "Price quoted");
                PriceQuote::genuine(value)
            }
            RetryResult::Exhausted { last_error, attempts } => {
                tracing::warn!(
                    item_id = %id,
                    attempts,
                    error = %last_error,
                    fallback_price = self.fallback_price,
                    "Pricing unavailable, using fallback price"
                );
                metrics::record_pricing_fallback("exhausted");
                PriceQuote::fallback(self.fallback_price)
            }
            RetryResult::ShortCircuited { attempts } => {
                tracing::warn!(
                    item_id = %id,
                    attempts,
                    breaker = %self.breaker.name(),
                    fallback_price = self.fallback_price,
                    "Circuit open, using fallback price"
                );
                metrics::record_pricing_fallback("circuit_open");
                PriceQuote::fallback(self.fallback_price)
            }
        }
    }

    async fn attempt(&self, id: ItemId, attempt: u32) -> AttemptOutcome<f64, PricingError> {
        let permit = match self.breaker.try_acquire() {
            Ok(permit) => permit,
            Err(open) => {
                tracing::debug!(item_id = %id, attempt, retry_after = ?open.retry_after, "Pricing call short-circuited");
                metrics::record_pricing_attempt("short_circuited");
                return AttemptOutcome::ShortCircuited;
            }
        };

        match with_deadline(self.attempt_timeout, self.source.fetch_price(id)).await {
            Ok(price) => {
                permit.success();
                metrics::record_pricing_attempt("success");
                AttemptOutcome::Success(price)
            }
            Err(e) => {
                permit.failure();
                tracing::warn!(item_id = %id, attempt, error = %e, "Pricing call failed");
                metrics::record_pricing_attempt(e.kind());
                AttemptOutcome::Retriable(e)
            }
        }
    }
}
