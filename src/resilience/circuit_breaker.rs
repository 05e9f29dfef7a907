//! Circuit breaker for remote dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a limited number of trial calls probe for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate >= threshold over the sliding window
//!                (evaluated once minimum_calls outcomes are recorded)
//! Open → Half-Open: first call after the cooldown
//! Half-Open → Closed: a trial call succeeds
//! Half-Open → Open: a trial call fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, shared by every caller through `Arc`
//! - All state lives behind a single mutex, never held across an `.await`
//! - Permission is an RAII [`CallPermit`]; an abandoned trial frees its slot
//! - Each transition bumps a generation; outcomes of older permits are ignored

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn name(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A call was rejected without reaching the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit open")]
pub struct CircuitOpen {
    /// Time left until trial calls are allowed, if known.
    pub retry_after: Option<Duration>,
}

/// Counters describing breaker behaviour since creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BreakerMetrics {
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
    pub times_opened: u64,
    pub times_closed: u64,
}

/// Count-based window over the most recent call outcomes.
#[derive(Debug)]
struct SlidingWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
    failures: usize,
}

impl SlidingWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    fn record(&mut self, failed: bool) {
        if self.outcomes.len() == self.capacity && self.outcomes.pop_front() == Some(true) {
            self.failures -= 1;
        }
        self.outcomes.push_back(failed);
        if failed {
            self.failures += 1;
        }
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Failure rate in percent.
    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.failures as f64 * 100.0 / self.outcomes.len() as f64
    }

    fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    window: SlidingWindow,
    open_until: Option<Instant>,
    trials_in_flight: u32,
    generation: u64,
    metrics: BreakerMetrics,
}

/// Circuit breaker guarding one remote dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_rate_threshold: f64,
    minimum_calls: usize,
    cooldown: Duration,
    half_open_trials: u32,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::set_breaker_state(&name, CircuitState::Closed);
        Self {
            name,
            failure_rate_threshold: config.failure_rate_threshold,
            minimum_calls: config.minimum_calls.max(1),
            cooldown: Duration::from_millis(config.open_cooldown_ms),
            half_open_trials: config.half_open_trials.max(1),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                window: SlidingWindow::new(config.window_size),
                open_until: None,
                trials_in_flight: 0,
                generation: 0,
                metrics: BreakerMetrics::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state as last recorded.
    ///
    /// An Open breaker whose cooldown has elapsed still reports Open until the
    /// next call asks for permission.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn metrics(&self) -> BreakerMetrics {
        self.lock().metrics.clone()
    }

    /// Failure rate (percent) over the current window.
    pub fn failure_rate(&self) -> f64 {
        self.lock().window.failure_rate()
    }

    /// Ask permission to call the dependency.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, CircuitOpen> {
        let mut inner = self.lock();
        let now = Instant::now();

        if inner.state == CircuitState::Open {
            let open_until = inner.open_until;
            match open_until {
                Some(until) if now < until => {
                    inner.metrics.rejected_calls += 1;
                    return Err(CircuitOpen {
                        retry_after: Some(until - now),
                    });
                }
                _ => self.transition(&mut inner, CircuitState::HalfOpen),
            }
        }

        let state = inner.state;
        match state {
            CircuitState::Closed => Ok(CallPermit::new(self, inner.generation, false)),
            CircuitState::HalfOpen if inner.trials_in_flight < self.half_open_trials => {
                inner.trials_in_flight += 1;
                Ok(CallPermit::new(self, inner.generation, true))
            }
            _ => {
                inner.metrics.rejected_calls += 1;
                Err(CircuitOpen { retry_after: None })
            }
        }
    }

    fn on_success(&self, generation: u64, trial: bool) {
        let mut inner = self.lock();
        if generation != inner.generation {
            return;
        }
        inner.metrics.successful_calls += 1;

        let state = inner.state;
        match state {
            CircuitState::Closed => inner.window.record(false),
            CircuitState::HalfOpen => {
                if trial {
                    inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
                }
                self.transition(&mut inner, CircuitState::Closed);
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64, trial: bool) {
        let mut inner = self.lock();
        if generation != inner.generation {
            return;
        }
        inner.metrics.failed_calls += 1;

        let state = inner.state;
        match state {
            CircuitState::Closed => {
                inner.window.record(true);
                let rate = inner.window.failure_rate();
                if inner.window.len() >= self.minimum_calls && rate >= self.failure_rate_threshold {
                    tracing::warn!(
                        breaker = %self.name,
                        failure_rate = rate,
                        threshold = self.failure_rate_threshold,
                        "Failure rate threshold exceeded"
                    );
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                if trial {
                    inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
                }
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn release_trial(&self, generation: u64) {
        let mut inner = self.lock();
        if generation == inner.generation && inner.state == CircuitState::HalfOpen {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.trials_in_flight = 0;

        match to {
            CircuitState::Open => {
                inner.open_until = Some(Instant::now() + self.cooldown);
                inner.metrics.times_opened += 1;
            }
            CircuitState::Closed => {
                inner.open_until = None;
                inner.window.clear();
                inner.metrics.times_closed += 1;
            }
            CircuitState::HalfOpen => {}
        }

        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %from,
                cooldown = ?self.cooldown,
                "Circuit opened"
            ),
            _ => tracing::info!(breaker = %self.name, from = %from, to = %to, "Circuit state changed"),
        }
        metrics::record_breaker_transition(&self.name, to);
        metrics::set_breaker_state(&self.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Permission for one call through the breaker.
///
/// Report the outcome with [`CallPermit::success`] or [`CallPermit::failure`].
/// Dropping the permit without an outcome records nothing, but frees the
/// half-open trial slot it may hold.
#[must_use = "report the call outcome through the permit"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64, trial: bool) -> Self {
        Self {
            breaker,
            generation,
            trial,
            settled: false,
        }
    }

    /// Whether this permit is a half-open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation, self.trial);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation, self.trial);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial(self.generation);
        }
    }
}
