//! Authentication Module
//! Mission: Verify bearer tokens and re-check account state on every request

pub mod api;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod refresh;
pub mod user_store;

pub use api::AuthState;
pub use error::{AuthError, StoreError, TokenError};
pub use jwt::TokenCodec;
pub use middleware::{auth_middleware, extract_credential, GateState};
pub use models::{AccountSnapshot, Claims, Identity};
pub use refresh::RefreshEngine;
pub use user_store::{SqliteUserStore, UserLookup};
