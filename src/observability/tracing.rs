//! Per-request tracing spans.

use axum::{body::Body, http::Request};
use tracing::Span;

use crate::http::request::X_REQUEST_ID;

/// Build the span wrapping one HTTP request.
///
/// The request ID is assigned by an outer layer, so it is already present.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        request_id = %request_id,
    )
}
