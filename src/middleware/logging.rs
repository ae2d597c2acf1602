//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code, and latency.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs at INFO for completed requests, WARN for 5xx.
/// Auth rejections (401/403) are tagged so they stand out when grepping.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Skip logging for health checks to reduce noise
    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        500.. => warn!(
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request failed (5xx)"
        ),
        401 | 403 => info!(
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request rejected by auth gate"
        ),
        _ => info!(
            method = %method,
            path = %path,
            status,
            latency_ms,
            rotated = response.headers().contains_key(super::cors::NEW_TOKEN_HEADER),
            "Request completed"
        ),
    }

    response
}
