//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds within bounds)
//! - Check the pricing URL parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::time::Duration;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::resilience::RetryPolicy;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::new("listener.bind_address", "must not be empty"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    let pricing = &config.pricing;
    if let Err(e) = url::Url::parse(&pricing.base_url) {
        errors.push(ValidationError::new(
            "pricing.base_url",
            format!("invalid URL '{}': {}", pricing.base_url, e),
        ));
    }
    if pricing.timeout_ms == 0 {
        errors.push(ValidationError::new("pricing.timeout_ms", "must be > 0"));
    }
    if !pricing.fallback_price.is_finite() || pricing.fallback_price < 0.0 {
        errors.push(ValidationError::new(
            "pricing.fallback_price",
            "must be a finite, non-negative number",
        ));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    // The pricing call runs after the stock change is committed, so the HTTP
    // deadline must outlast the whole retry budget.
    if config.listener.request_timeout_secs > 0 && pricing.timeout_ms > 0 && retries.max_attempts > 0 {
        let pricing_budget = RetryPolicy::from(retries)
            .worst_case_duration(Duration::from_millis(pricing.timeout_ms));
        let request_timeout = Duration::from_secs(config.listener.request_timeout_secs);
        if request_timeout <= pricing_budget {
            errors.push(ValidationError::new(
                "listener.request_timeout_secs",
                format!(
                    "must exceed the worst-case pricing time of {}ms (attempts x timeout + backoff)",
                    pricing_budget.as_millis()
                ),
            ));
        }
    }

    let breaker = &config.circuit_breaker;
    if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 100.0) {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_rate_threshold",
            "must be in (0, 100]",
        ));
    }
    if breaker.window_size == 0 {
        errors.push(ValidationError::new("circuit_breaker.window_size", "must be >= 1"));
    }
    if breaker.minimum_calls == 0 || breaker.minimum_calls > breaker.window_size {
        errors.push(ValidationError::new(
            "circuit_breaker.minimum_calls",
            "must be between 1 and window_size",
        ));
    }
    if breaker.open_cooldown_ms == 0 {
        errors.push(ValidationError::new("circuit_breaker.open_cooldown_ms", "must be > 0"));
    }
    if breaker.half_open_trials == 0 {
        errors.push(ValidationError::new("circuit_breaker.half_open_trials", "must be >= 1"));
    }

    for item in &config.seed {
        if item.title.trim().is_empty() {
            errors.push(ValidationError::new("seed.title", "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
