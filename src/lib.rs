//! Gatekeeper Backend Library
//!
//! Request authentication for the user-management API: bearer token parsing,
//! signature and expiry checks, a live account check against the user store
//! on every request, and token rotation when an account's role has changed.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod response;
pub mod telemetry;
