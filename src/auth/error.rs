//! Authentication errors and their HTTP mapping.

use crate::response::error_response;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Token codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("unexpected signing algorithm")]
    AlgorithmMismatch,
    #[error("token issuance failed: {0}")]
    Issuance(String),
}

/// User store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(i64),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can stop a request at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed token")]
    MalformedToken,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("unexpected signing algorithm")]
    AlgorithmMismatch,
    #[error("account disabled")]
    AccountDisabled,
    #[error("account not found")]
    AccountNotFound,
    #[error("user store unavailable: {0}")]
    StoreUnavailable(String),
    /// Logged by the refresh engine when minting a replacement token fails.
    /// The gate never rejects with it: the request proceeds on the old token.
    #[error("rotation token issuance failed: {0}")]
    RotationIssuanceFailed(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::AlgorithmMismatch => StatusCode::UNAUTHORIZED,
            AuthError::AccountDisabled
            | AuthError::AccountNotFound
            | AuthError::StoreUnavailable(_) => StatusCode::FORBIDDEN,
            AuthError::RotationIssuanceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Token failures share one message so callers
    /// cannot tell which check tripped.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Unauthorized: No token provided",
            AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::AlgorithmMismatch => "Unauthorized: Invalid token",
            AuthError::AccountDisabled
            | AuthError::AccountNotFound
            | AuthError::StoreUnavailable(_) => "Account is disabled or does not exist",
            AuthError::RotationIssuanceFailed(_) => "Internal server error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => AuthError::MalformedToken,
            TokenError::SignatureInvalid => AuthError::SignatureInvalid,
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::AlgorithmMismatch => AuthError::AlgorithmMismatch,
            TokenError::Issuance(reason) => AuthError::RotationIssuanceFailed(reason),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AuthError::AccountNotFound,
            StoreError::Unavailable(reason) => AuthError::StoreUnavailable(reason),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.public_message())
    }
}
