//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and a live account check

use crate::auth::{
    error::AuthError,
    jwt::TokenCodec,
    models::Identity,
    refresh::RefreshEngine,
    user_store::UserLookup,
};
use crate::middleware::{apply_cors_headers, NEW_TOKEN_HEADER};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Shared state for [`auth_middleware`]
#[derive(Clone)]
pub struct GateState {
    codec: Arc<TokenCodec>,
    engine: Arc<RefreshEngine>,
}

/// A request that made it through the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePass {
    pub identity: Identity,
    pub new_token: Option<String>,
}

impl GateState {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn UserLookup>) -> Self {
        let engine = Arc::new(RefreshEngine::new(codec.clone(), store));
        Self { codec, engine }
    }

    /// Run every check for one request. The store is only consulted once the
    /// token itself has verified.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<GatePass, AuthError> {
        let raw = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingCredential)?;
        let raw = raw.to_str().map_err(|_| AuthError::MalformedToken)?;
        if raw.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let token = extract_credential(raw);
        let claims = self.codec.verify(token).map_err(|e| {
            debug!(reason = %e, "Token verification failed");
            AuthError::from(e)
        })?;

        let outcome = self.engine.refresh(&claims).await?;

        Ok(GatePass {
            identity: Identity {
                user_id: claims.user_id,
                role: outcome.role,
                username: claims.username,
            },
            new_token: outcome.new_token,
        })
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// Accepts `Bearer <t>` with any amount of whitespace and any case, the glued
/// `Bearer<t>` form some clients send, and otherwise treats the whole value
/// as the token.
pub fn extract_credential(header_value: &str) -> &str {
    let parts: Vec<&str> = header_value.split_whitespace().collect();

    let token = if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
        parts[1]
    } else if header_value.len() >= 6
        && header_value.as_bytes()[..6].eq_ignore_ascii_case(b"bearer")
    {
        &header_value[6..]
    } else {
        header_value
    };

    token.trim()
}

/// Auth middleware that validates tokens and re-checks the account on every call
pub async fn auth_middleware(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let pass = match gate.authorize(req.headers()).await {
        Ok(pass) => pass,
        Err(err) => {
            warn!(
                path = %req.uri().path(),
                status = err.status().as_u16(),
                reason = %err,
                "Request rejected"
            );
            return err.into_response();
        }
    };

    // Add identity to request extensions so handlers can access it
    req.extensions_mut().insert(pass.identity);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    apply_cors_headers(headers);

    if let Some(token) = pass.new_token {
        match HeaderValue::from_str(&token) {
            Ok(value) => {
                headers.insert(NEW_TOKEN_HEADER, value);
            }
            Err(e) => error!(error = %e, "Rotated token is not a valid header value"),
        }
    }

    response
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
