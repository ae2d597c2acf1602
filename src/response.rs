//! JSON response envelope.
//!
//! Every API body, success or failure, is `{success, code, message, data?}`.

use crate::middleware::apply_cors_headers;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Failure envelope with CORS headers attached.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse::<()> {
        success: false,
        code: status.as_u16(),
        message: message.into(),
        data: None,
    };

    let mut response = (status, Json(body)).into_response();
    apply_cors_headers(response.headers_mut());
    response
}

/// 200 envelope with CORS headers attached.
pub fn success_response<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    let body = ApiResponse {
        success: true,
        code: StatusCode::OK.as_u16(),
        message: message.into(),
        data: Some(data),
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    apply_cors_headers(response.headers_mut());
    response
}
