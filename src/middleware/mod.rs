//! HTTP middleware shared by every route.
//!
//! - Request logging with latency tracking
//! - Cross-origin headers and preflight handling

pub mod cors;
pub mod logging;

pub use cors::{apply_cors_headers, cors_layer, NEW_TOKEN_HEADER};
pub use logging::request_logging;
