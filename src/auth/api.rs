//! Authentication API Endpoints
//! Mission: Provide login, registration, identity and user-management endpoints

use crate::auth::{
    jwt::TokenCodec,
    models::{
        CreateUserRequest, Identity, LoginRequest, LoginResponse, RegisterRequest,
        UpdateUserRequest, User, ADMIN_ROLE, DEFAULT_ROLE,
    },
    user_store::SqliteUserStore,
};
use crate::response::{error_response, success_response};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<SqliteUserStore>,
    pub codec: Arc<TokenCodec>,
}

impl AuthState {
    pub fn new(user_store: Arc<SqliteUserStore>, codec: Arc<TokenCodec>) -> Self {
        Self { user_store, codec }
    }

    /// Run store work (rusqlite, bcrypt) off the async workers.
    async fn with_store<T, F>(&self, work: F) -> Result<T, AuthApiError>
    where
        F: FnOnce(&SqliteUserStore) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.user_store.clone();
        tokio::task::spawn_blocking(move || work(&store))
            .await
            .map_err(|e| AuthApiError::Internal(e.to_string()))?
            .map_err(|e| AuthApiError::Internal(e.to_string()))
    }

    fn login_response(&self, user: User) -> Result<LoginResponse, AuthApiError> {
        let token = self
            .codec
            .issue(user.id, &user.username, &user.role)
            .map_err(|e| AuthApiError::Internal(e.to_string()))?;

        Ok(LoginResponse {
            token,
            id: user.id,
            username: user.username,
            role: user.role,
            expires_in: self.codec.ttl().as_secs(),
        })
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthApiError> {
    if username.trim().is_empty() {
        return Err(AuthApiError::InvalidInput("Username must not be empty"));
    }
    validate_password(password)
}

fn validate_password(password: &str) -> Result<(), AuthApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthApiError::InvalidInput(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn validate_role(role: &str) -> Result<(), AuthApiError> {
    if role.trim().is_empty() {
        return Err(AuthApiError::InvalidInput("Role must not be empty"));
    }
    Ok(())
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    let LoginRequest { username, password } = payload;
    let attempted = username.clone();
    let (user, valid) = state
        .with_store(move |store| {
            let Some(user) = store.find_by_username(&username)? else {
                return Ok(None);
            };
            let valid = store.verify_password(&user, &password)?;
            Ok(Some((user, valid)))
        })
        .await?
        .ok_or(AuthApiError::InvalidCredentials)?;

    if !valid {
        warn!("❌ Failed login attempt: {}", attempted);
        return Err(AuthApiError::InvalidCredentials);
    }

    if !user.enabled {
        warn!(user_id = user.id, "Login refused for disabled account");
        return Err(AuthApiError::AccountDisabled);
    }

    let user_id = user.id;
    let response = state.login_response(user)?;

    if let Err(e) = state
        .with_store(move |store| store.touch_last_login(user_id))
        .await
    {
        warn!(user_id, error = %e, "Failed to record login time");
    }

    info!("✅ Login successful: {} ({})", response.username, response.role);

    Ok(success_response("Login successful", response))
}

/// Self-registration - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AuthApiError> {
    let RegisterRequest { username, password } = payload;
    validate_credentials(&username, &password)?;

    let user = state
        .with_store(move |store| {
            if store.find_by_username(&username)?.is_some() {
                return Ok(None);
            }
            store.create_user(&username, &password, DEFAULT_ROLE).map(Some)
        })
        .await?
        .ok_or(AuthApiError::UserAlreadyExists)?;

    info!("📝 Registered user: {} (id {})", user.username, user.id);

    let response = state.login_response(user)?;
    Ok(success_response("Registration successful", response))
}

/// Current identity - GET /api/auth/me (behind the gate)
pub async fn get_current_user(identity: Identity) -> Response {
    success_response("OK", identity)
}

/// Create user - POST /api/users (admin only)
pub async fn create_user(
    State(state): State<AuthState>,
    identity: Identity,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Response, AuthApiError> {
    if !identity.is_admin() {
        return Err(AuthApiError::Forbidden);
    }

    let CreateUserRequest {
        username,
        password,
        role,
    } = payload;
    validate_credentials(&username, &password)?;
    let role = role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
    validate_role(&role)?;

    let user = state
        .with_store(move |store| {
            if store.find_by_username(&username)?.is_some() {
                return Ok(None);
            }
            store.create_user(&username, &password, &role).map(Some)
        })
        .await?
        .ok_or(AuthApiError::UserAlreadyExists)?;

    info!(
        "👤 Admin {} created user: {} ({})",
        identity.username, user.username, user.role
    );

    Ok(success_response("User created", user))
}

/// Update role, status or password - PUT /api/users/:id
///
/// Admins may edit themselves and any non-admin. Other users may only
/// change their own password.
pub async fn update_user(
    State(state): State<AuthState>,
    identity: Identity,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Response, AuthApiError> {
    let target = state
        .with_store(move |store| store.find_by_id(user_id))
        .await?
        .ok_or(AuthApiError::UserNotFound)?;

    let editing_self = target.id == identity.user_id;
    if identity.is_admin() {
        if target.role == ADMIN_ROLE && !editing_self {
            return Err(AuthApiError::CannotModifyAdmin);
        }
    } else if !editing_self || payload.role.is_some() || payload.enabled.is_some() {
        return Err(AuthApiError::Forbidden);
    }

    if let Some(role) = &payload.role {
        validate_role(role)?;
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }

    let UpdateUserRequest {
        role,
        enabled,
        password,
    } = payload;
    let updated = state
        .with_store(move |store| {
            if let Some(role) = &role {
                store.set_role(user_id, role)?;
            }
            if let Some(enabled) = enabled {
                store.set_enabled(user_id, enabled)?;
            }
            if let Some(password) = &password {
                store.set_password(user_id, password)?;
            }
            store.find_by_id(user_id)
        })
        .await?
        .ok_or(AuthApiError::UserNotFound)?;

    info!(
        "✏️  {} updated user {} (role {}, enabled {})",
        identity.username, updated.id, updated.role, updated.enabled
    );

    Ok(success_response("User updated", updated))
}

/// Delete user - DELETE /api/users/:id (admin only)
pub async fn delete_user(
    State(state): State<AuthState>,
    identity: Identity,
    Path(user_id): Path<i64>,
) -> Result<Response, AuthApiError> {
    if !identity.is_admin() {
        return Err(AuthApiError::Forbidden);
    }
    if user_id == identity.user_id {
        return Err(AuthApiError::CannotDeleteSelf);
    }

    let deleted = state
        .with_store(move |store| store.delete_user(user_id))
        .await?;
    if !deleted {
        return Err(AuthApiError::UserNotFound);
    }

    info!("🗑️  Admin {} deleted user {}", identity.username, user_id);

    Ok(success_response("User deleted", json!({ "id": user_id })))
}

/// Auth API errors
#[derive(Debug, Error)]
pub enum AuthApiError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("insufficient permissions")]
    Forbidden,
    #[error("cannot modify another admin")]
    CannotModifyAdmin,
    #[error("cannot delete self")]
    CannotDeleteSelf,
    #[error("user not found")]
    UserNotFound,
    #[error("username already taken")]
    UserAlreadyExists,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::AccountDisabled => (StatusCode::FORBIDDEN, "Account is disabled"),
            AuthApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthApiError::CannotModifyAdmin => {
                (StatusCode::FORBIDDEN, "Cannot modify another admin account")
            }
            AuthApiError::CannotDeleteSelf => {
                (StatusCode::FORBIDDEN, "Cannot delete your own account")
            }
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::UserAlreadyExists => (StatusCode::CONFLICT, "Username already taken"),
            AuthApiError::InvalidInput(reason) => (StatusCode::BAD_REQUEST, *reason),
            AuthApiError::Internal(detail) => {
                error!(detail = %detail, "Auth API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        error_response(status, message)
    }
}
