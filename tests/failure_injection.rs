//! Failure injection tests for the pricing dependency.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use book_lending::config::{CircuitBreakerConfig, RetryConfig, SeedItem};
use book_lending::inventory::ItemId;
use book_lending::lifecycle::build_coordinator;
use book_lending::resilience::CircuitState;

mod common;
use common::{add_book, Harness, MockPriceSource, PriceMode};

fn tripping_harness() -> Harness {
    Harness {
        retries: RetryConfig {
            max_attempts: 2,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        },
        breaker: CircuitBreakerConfig {
            failure_rate_threshold: 50.0,
            window_size: 4,
            minimum_calls: 4,
            open_cooldown_ms: 10_000,
            half_open_trials: 1,
        },
        ..Harness::default()
    }
}

#[tokio::test]
async fn test_failing_pricing_never_blocks_a_borrow() {
    let coordinator = Harness::default().build(MockPriceSource::new(PriceMode::Fail));
    let id = add_book(&coordinator, "Dune", 3).await;

    let outcome = coordinator.borrow(id).await.unwrap();
    assert!(outcome.pricing_fallback);
    assert_eq!(outcome.price, 0.0);
    assert_eq!(outcome.stock_left, 2);
    assert_eq!(coordinator.get_item(id).await.unwrap().stock, 2);
    assert_eq!(coordinator.pricing().source().calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_open_breaker_skips_remote_and_backoff() {
    let coordinator = tripping_harness().build(MockPriceSource::new(PriceMode::Fail));
    let id = add_book(&coordinator, "Dune", 10).await;
    let breaker = coordinator.pricing().breaker().clone();

    for _ in 0..2 {
        assert!(coordinator.borrow(id).await.unwrap().pricing_fallback);
    }
    assert_eq!(coordinator.pricing().source().calls(), 4);
    assert_eq!(breaker.state(), CircuitState::Open);

    let start = Instant::now();
    let outcome = coordinator.borrow(id).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO, "short-circuit must not wait");
    assert!(outcome.pricing_fallback);
    assert_eq!(outcome.stock_left, 7);
    assert_eq!(coordinator.pricing().source().calls(), 4);
    assert_eq!(breaker.metrics().rejected_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_recovers_after_cooldown() {
    let coordinator = tripping_harness().build(MockPriceSource::new(PriceMode::Fail));
    let id = add_book(&coordinator, "Dune", 10).await;
    let breaker = coordinator.pricing().breaker().clone();

    coordinator.borrow(id).await.unwrap();
    coordinator.borrow(id).await.unwrap();
    assert_eq!(breaker.state(), CircuitState::Open);

    tokio::time::advance(Duration::from_millis(10_001)).await;
    coordinator.pricing().source().set_mode(PriceMode::Price(7.0));

    let outcome = coordinator.borrow(id).await.unwrap();
    assert!(!outcome.pricing_fallback);
    assert_eq!(outcome.price, 7.0);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(coordinator.pricing().source().calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_failed_trial_reopens_breaker() {
    let coordinator = tripping_harness().build(MockPriceSource::new(PriceMode::Fail));
    let id = add_book(&coordinator, "Dune", 10).await;
    let breaker = coordinator.pricing().breaker().clone();

    coordinator.borrow(id).await.unwrap();
    coordinator.borrow(id).await.unwrap();
    tokio::time::advance(Duration::from_millis(10_001)).await;

    // One trial reaches the source; the retry after it finds the breaker open again.
    let outcome = coordinator.borrow(id).await.unwrap();
    assert!(outcome.pricing_fallback);
    assert_eq!(coordinator.pricing().source().calls(), 5);
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(breaker.metrics().times_opened, 2);
}

#[tokio::test]
async fn test_http_price_is_quoted() {
    let addr = common::start_pricing_backend(|path| async move {
        assert_eq!(path, "/price/1");
        (200, r#"{"price": 12.50}"#.to_string())
    })
    .await;

    let mut config = common::service_config(addr);
    config.seed.push(SeedItem {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        stock: 5,
    });
    let coordinator = build_coordinator(&config).await.unwrap();

    let outcome = coordinator.borrow(ItemId(1)).await.unwrap();
    assert_eq!(outcome.price, 12.5);
    assert!(!outcome.pricing_fallback);
    assert_eq!(outcome.stock_left, 4);
}

#[tokio::test]
async fn test_http_timeouts_exhaust_attempts() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = common::start_pricing_backend(move |_path| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            (200, r#"{"price": 1.0}"#.to_string())
        }
    })
    .await;

    let mut config = common::service_config(addr);
    config.pricing.timeout_ms = 100;
    config.retries.max_attempts = 2;
    config.seed.push(SeedItem {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        stock: 5,
    });
    let coordinator = build_coordinator(&config).await.unwrap();

    let outcome = coordinator.borrow(ItemId(1)).await.unwrap();
    assert!(outcome.pricing_fallback);
    assert_eq!(outcome.price, 0.0);
    assert_eq!(outcome.stock_left, 4);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_http_errors_and_garbage_fall_back() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = common::start_pricing_backend(move |_path| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n % 2 == 0 {
                (500, r#"{"error": "boom"}"#.to_string())
            } else {
                (200, r#"{"cost": "free"}"#.to_string())
            }
        }
    })
    .await;

    let mut config = common::service_config(addr);
    config.seed.push(SeedItem {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        stock: 1,
    });
    let coordinator = build_coordinator(&config).await.unwrap();

    let outcome = coordinator.borrow(ItemId(1)).await.unwrap();
    assert!(outcome.pricing_fallback);
    assert_eq!(outcome.stock_left, 0);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
