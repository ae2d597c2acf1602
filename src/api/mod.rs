//! HTTP surface.
//!
//! Public: `/health`, `POST /api/auth/login`, `POST /api/auth/register`.
//! Gated: `GET /api/auth/me` and user management under `/api/users`.

use crate::auth::{api as auth_api, auth_middleware, AuthState, GateState};
use crate::middleware::{cors_layer, request_logging};
use crate::response::{error_response, success_response};
use axum::{
    http::{StatusCode, Uri},
    middleware,
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde_json::json;

/// Build the application router.
pub fn router(auth_state: AuthState, gate: GateState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route("/api/users", post(auth_api::create_user))
        .route(
            "/api/users/:id",
            put(auth_api::update_user).delete(auth_api::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(gate, auth_middleware));

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/register", post(auth_api::register));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(auth_state)
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer())
}

async fn health_check() -> Response {
    success_response("OK", json!({ "status": "healthy" }))
}

async fn not_found(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        error_response(
            StatusCode::NOT_FOUND,
            "API path does not exist, check spelling and case",
        )
    } else {
        error_response(StatusCode::NOT_FOUND, "Not found")
    }
}
