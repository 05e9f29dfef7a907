//! Request identification.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the client did not send one
//! - Echo the ID back on the response
//! - Open a tracing span per request carrying the ID
//!
//! # Design Decisions
//! - Request ID added as early as possible so every log line can carry it

use axum::{body::Body, http::Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that stamps `x-request-id` on incoming requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Read the request ID, or `"unknown"` if the header is missing or not UTF-8.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for one request, keyed by its ID.
pub fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request),
        method = %request.method(),
        uri = %request.uri(),
    )
}
