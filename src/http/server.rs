//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ListenerConfig;
use crate::http::handlers;
use crate::http::request;
use crate::inventory::InventoryStore;
use crate::lending::BorrowCoordinator;
use crate::observability::metrics;
use crate::pricing::PriceSource;

/// Application state injected into handlers.
pub struct AppState<S, P> {
    pub coordinator: Arc<BorrowCoordinator<S, P>>,
}

impl<S, P> Clone for AppState<S, P> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

/// HTTP server for the books API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around `coordinator`.
    pub fn new<S: InventoryStore, P: PriceSource>(
        coordinator: BorrowCoordinator<S, P>,
        config: &ListenerConfig,
    ) -> Self {
        let state = AppState {
            coordinator: Arc::new(coordinator),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The borrow route sits outside the request timeout: once its stock change
    /// is committed the response must carry a quote, and the pricing client
    /// already bounds its own duration.
    #[allow(deprecated)]
    fn build_router<S: InventoryStore, P: PriceSource>(
        config: &ListenerConfig,
        state: AppState<S, P>,
    ) -> Router {
        let bounded = Router::new()
            .route(
                "/api/books",
                get(handlers::list_books::<S, P>).post(handlers::create_book::<S, P>),
            )
            .route("/api/books/instance", get(handlers::instance_info::<S, P>))
            .route("/api/books/{id}", get(handlers::get_book::<S, P>))
            .route("/api/books/{id}/reset-stock", post(handlers::reset_stock::<S, P>))
            .route("/health", get(handlers::health::<S, P>))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )));

        Router::new()
            .route("/api/books/{id}/borrow", post(handlers::borrow_book::<S, P>))
            .merge(bounded)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
                    .layer(request::propagate_request_id_layer())
                    .layer(middleware::from_fn(track_metrics)),
            )
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
