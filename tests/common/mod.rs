//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use book_lending::config::{CircuitBreakerConfig, PricingConfig, RetryConfig, ServiceConfig};
use book_lending::http::HttpServer;
use book_lending::inventory::{InMemoryInventoryStore, ItemId, NewItem};
use book_lending::lending::BorrowCoordinator;
use book_lending::lifecycle::Shutdown;
use book_lending::pricing::{PriceSource, PricingError, ResilientPriceClient};
use book_lending::resilience::CircuitBreaker;

/// Behaviour of [`MockPriceSource`].
#[derive(Debug, Clone, Copy)]
pub enum PriceMode {
    Price(f64),
    Fail,
    Hang,
}

/// In-process price source with a switchable behaviour and a call counter.
pub struct MockPriceSource {
    calls: AtomicU32,
    mode: Mutex<PriceMode>,
}

impl MockPriceSource {
    pub fn new(mode: PriceMode) -> Self {
        Self {
            calls: AtomicU32::new(0),
            mode: Mutex::new(mode),
        }
    }

    pub fn set_mode(&self, mode: PriceMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_price(&self, _id: ItemId) -> Result<f64, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            PriceMode::Price(v) => Ok(v),
            PriceMode::Fail => Err(PricingError::Status(503)),
            PriceMode::Hang => std::future::pending().await,
        }
    }
}

/// Settings for building a coordinator in tests.
pub struct Harness {
    pub pricing: PricingConfig,
    pub retries: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            pricing: PricingConfig {
                timeout_ms: 200,
                ..PricingConfig::default()
            },
            retries: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 10,
                max_delay_ms: 50,
            },
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Harness {
    pub fn build<P: PriceSource>(&self, source: P) -> BorrowCoordinator<InMemoryInventoryStore, P> {
        let breaker = Arc::new(CircuitBreaker::new("pricing", &self.breaker));
        let client = ResilientPriceClient::new(source, breaker, &self.pricing, &self.retries);
        BorrowCoordinator::new(
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(client),
            "test-instance",
        )
    }
}

/// Register a book and return its id.
pub async fn add_book<P: PriceSource>(
    coordinator: &BorrowCoordinator<InMemoryInventoryStore, P>,
    title: &str,
    stock: u32,
) -> ItemId {
    coordinator
        .create_item(NewItem {
            title: title.to_string(),
            author: "Test Author".to_string(),
            stock,
        })
        .await
        .unwrap()
        .id
}

/// Start a programmable pricing backend on an ephemeral port.
///
/// `f` receives the request path and returns a status and body.
pub async fn start_pricing_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let path = match read_request_path(&mut socket).await {
                    Some(p) => p,
                    None => return,
                };
                let (status, body) = f(path).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request_path(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
}

/// Service config pointing at `pricing_addr`, with short timeouts.
pub fn service_config(pricing_addr: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.instance_name = "test-instance".to_string();
    config.pricing.base_url = format!("http://{}", pricing_addr);
    config.pricing.timeout_ms = 200;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config
}

/// Serve `coordinator` on an ephemeral port until `shutdown` fires.
pub async fn spawn_service<P: PriceSource>(
    coordinator: BorrowCoordinator<InMemoryInventoryStore, P>,
    config: &ServiceConfig,
    shutdown: &Shutdown,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(coordinator, &config.listener);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    addr
}

/// HTTP client that bypasses any system proxy and never pools.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
