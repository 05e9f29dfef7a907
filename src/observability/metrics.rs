//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lending_borrows_total` (counter): borrow results by outcome
//! - `pricing_attempts_total` (counter): remote pricing attempts by result
//! - `pricing_fallbacks_total` (counter): fallback quotes by reason
//! - `circuit_breaker_transitions_total` (counter): transitions by breaker and target state
//! - `circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `http_requests_total` (counter) and `http_request_duration_seconds` (histogram)
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_borrow(outcome: &'static str) {
    counter!("lending_borrows_total", "outcome" => outcome).increment(1);
}

pub fn record_pricing_attempt(result: &'static str) {
    counter!("pricing_attempts_total", "result" => result).increment(1);
}

pub fn record_pricing_fallback(reason: &'static str) {
    counter!("pricing_fallbacks_total", "reason" => reason).increment(1);
}

pub fn record_breaker_transition(breaker: &str, to: CircuitState) {
    counter!(
        "circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.name()
    )
    .increment(1);
}

pub fn set_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("circuit_breaker_state", "breaker" => breaker.to_string()).set(value);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}
