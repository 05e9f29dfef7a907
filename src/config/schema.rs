//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the lending service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the lending service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name reported in borrow responses and instance info.
    pub instance_name: String,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Remote pricing dependency.
    pub pricing: PricingConfig,

    /// Retry configuration for pricing calls.
    pub retries: RetryConfig,

    /// Circuit breaker guarding the pricing dependency.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Items registered at startup.
    pub seed: Vec<SeedItem>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: "unknown".to_string(),
            listener: ListenerConfig::default(),
            pricing: PricingConfig::default(),
            retries: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            observability: ObservabilityConfig::default(),
            seed: Vec::new(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// Request timeout for the HTTP surface in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Pricing dependency configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Base URL of the pricing service; prices live under `/price/{id}`.
    pub base_url: String,

    /// Deadline for a single attempt in milliseconds.
    pub timeout_ms: u64,

    /// Price returned when the dependency cannot be reached.
    pub fallback_price: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082".to_string(),
            timeout_ms: 2000,
            fallback_price: 0.0,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failure rate (percent) at or above which the circuit opens.
    pub failure_rate_threshold: f64,

    /// Number of most recent calls kept in the sliding window.
    pub window_size: usize,

    /// Calls required in the window before the failure rate is evaluated.
    pub minimum_calls: usize,

    /// How long the circuit stays open before allowing trial calls, in milliseconds.
    pub open_cooldown_ms: u64,

    /// Concurrent trial calls permitted while half-open.
    pub half_open_trials: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            window_size: 10,
            minimum_calls: 5,
            open_cooldown_ms: 10_000,
            half_open_trials: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}

/// An inventory item registered at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedItem {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub stock: u32,
}
