//! Cross-origin headers.
//!
//! Every response leaving the service, including auth rejections, carries the
//! same open CORS allowance so browser clients can read error bodies and the
//! rotated `New-Token` header.

use axum::http::{
    header::{self, HeaderName, HeaderValue},
    HeaderMap, Method,
};
use tower_http::cors::{Any, CorsLayer};

/// Response header carrying a freshly rotated token
pub const NEW_TOKEN_HEADER: HeaderName = HeaderName::from_static("new-token");

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
pub const EXPOSED_HEADERS: &str = "New-Token";

/// Stamp the standard CORS headers onto a response.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );
}

/// Router-level layer answering preflight requests with the same policy.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([NEW_TOKEN_HEADER])
}
