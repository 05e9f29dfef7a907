//! Stand-in pricing service for manual end-to-end runs.
//!
//! `cargo run --example mock_pricing -- [fail-rate] [delay-ms]`
//!
//! Serves `GET /price/{id}` on 127.0.0.1:8082. A fraction of requests fail with
//! 503 and every response can be delayed, which is enough to watch the lending
//! service retry, trip its breaker and fall back.

use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use rand::Rng;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let fail_rate: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0.0);
    let delay_ms: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);

    let app = Router::new()
        .route(
            "/price/{id}",
            get(move |Path(id): Path<u64>| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                if rand::thread_rng().gen_bool(fail_rate.clamp(0.0, 1.0)) {
                    return Err(StatusCode::SERVICE_UNAVAILABLE);
                }
                let price = 5.0 + (id % 10) as f64 * 1.25;
                Ok(Json(json!({ "price": price })))
            }),
        )
        .route("/health", get(|| async { "ok" }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8082));
    println!(
        "Mock pricing service on http://{} (fail rate {}, delay {}ms)",
        addr, fail_rate, delay_ms
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
