//! Authorization refresh.
//!
//! A token's role is a cached hint. On every request the live account is read
//! back from the store and compared against it:
//!
//! | account            | role matches | outcome                          |
//! |--------------------|--------------|----------------------------------|
//! | disabled           | any          | reject (`AccountDisabled`)       |
//! | enabled            | yes          | accept                           |
//! | enabled            | no           | accept, rotate token to new role |
//! | missing / store down | any        | reject (fail closed)             |
//!
//! Rotation is best effort: if minting the replacement fails the request
//! still proceeds on the token's original role.

use crate::auth::error::{AuthError, StoreError};
use crate::auth::jwt::TokenCodec;
use crate::auth::models::{AccountSnapshot, Claims};
use crate::auth::user_store::UserLookup;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What the live account says about a token's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshDecision {
    Accept,
    Rotate { role: String },
}

/// Result of a successful refresh: the role to run this request with, and a
/// replacement token when one was minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub role: String,
    pub new_token: Option<String>,
}

/// Pure decision table. Disablement always wins over role drift.
pub fn decide(
    claims_role: &str,
    lookup: Result<AccountSnapshot, StoreError>,
) -> Result<RefreshDecision, AuthError> {
    let account = match lookup {
        Ok(account) => account,
        // Any lookup failure means we cannot prove the account is active.
        Err(StoreError::NotFound(_)) => return Err(AuthError::AccountNotFound),
        Err(StoreError::Unavailable(reason)) => return Err(AuthError::StoreUnavailable(reason)),
    };

    if !account.enabled {
        return Err(AuthError::AccountDisabled);
    }

    if account.role == claims_role {
        Ok(RefreshDecision::Accept)
    } else {
        Ok(RefreshDecision::Rotate { role: account.role })
    }
}

/// Re-validates verified claims against the user store.
pub struct RefreshEngine {
    codec: Arc<TokenCodec>,
    store: Arc<dyn UserLookup>,
}

impl RefreshEngine {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn UserLookup>) -> Self {
        Self { codec, store }
    }

    pub async fn refresh(&self, claims: &Claims) -> Result<RefreshOutcome, AuthError> {
        let lookup = self.store.lookup_by_id(claims.user_id).await;

        match decide(&claims.role, lookup) {
            Ok(RefreshDecision::Accept) => Ok(RefreshOutcome {
                role: claims.role.clone(),
                new_token: None,
            }),
            Ok(RefreshDecision::Rotate { role }) => Ok(self.rotate(claims, role)),
            Err(err) => {
                warn!(user_id = claims.user_id, reason = %err, "Account rejected by refresh check");
                Err(err)
            }
        }
    }

    fn rotate(&self, claims: &Claims, role: String) -> RefreshOutcome {
        match self.codec.issue(claims.user_id, &claims.username, &role) {
            Ok(token) => {
                info!(
                    user_id = claims.user_id,
                    old_role = %claims.role,
                    new_role = %role,
                    "Role changed, rotated token"
                );
                RefreshOutcome {
                    role,
                    new_token: Some(token),
                }
            }
            Err(err) => {
                let err = AuthError::from(err);
                error!(user_id = claims.user_id, error = %err, "Token rotation failed, keeping original role");
                RefreshOutcome {
                    role: claims.role.clone(),
                    new_token: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use async_trait::async_trait;

    fn snapshot(role: &str, enabled: bool) -> AccountSnapshot {
        AccountSnapshot {
            id: 7,
            role: role.to_string(),
            enabled,
        }
    }

    struct FixedStore(Result<AccountSnapshot, StoreError>);

    #[async_trait]
    impl UserLookup for FixedStore {
        async fn lookup_by_id(&self, _id: i64) -> Result<AccountSnapshot, StoreError> {
            self.0.clone()
        }
    }

    fn engine(store: Result<AccountSnapshot, StoreError>) -> (RefreshEngine, Arc<TokenCodec>) {
        let codec = Arc::new(TokenCodec::new(&AuthConfig::new("refresh-test-secret")));
        (
            RefreshEngine::new(codec.clone(), Arc::new(FixedStore(store))),
            codec,
        )
    }

    fn claims(role: &str) -> Claims {
        Claims {
            user_id: 7,
            username: "alice".to_string(),
            role: role.to_string(),
            iat: 0,
            exp: i64::MAX,
            iss: "myapp".to_string(),
        }
    }

    #[test]
    fn test_decide_table() {
        assert_eq!(
            decide("common", Ok(snapshot("common", true))),
            Ok(RefreshDecision::Accept)
        );
        assert_eq!(
            decide("common", Ok(snapshot("admin", true))),
            Ok(RefreshDecision::Rotate {
                role: "admin".to_string()
            })
        );
        assert_eq!(
            decide("common", Ok(snapshot("common", false))),
            Err(AuthError::AccountDisabled)
        );
    }

    #[test]
    fn test_disablement_wins_over_role_drift() {
        assert_eq!(
            decide("common", Ok(snapshot("admin", false))),
            Err(AuthError::AccountDisabled)
        );
    }

    #[test]
    fn test_lookup_failures_fail_closed() {
        assert_eq!(
            decide("common", Err(StoreError::NotFound(7))),
            Err(AuthError::AccountNotFound)
        );
        assert!(matches!(
            decide("common", Err(StoreError::Unavailable("timeout".into()))),
            Err(AuthError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_drift() {
        let (engine, _) = engine(Ok(snapshot("common", true)));
        let outcome = engine.refresh(&claims("common")).await.unwrap();
        assert_eq!(outcome.role, "common");
        assert!(outcome.new_token.is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_to_store_role() {
        let (engine, codec) = engine(Ok(snapshot("admin", true)));
        let outcome = engine.refresh(&claims("common")).await.unwrap();
        assert_eq!(outcome.role, "admin");

        let rotated = codec.verify(&outcome.new_token.unwrap()).unwrap();
        assert_eq!(rotated.role, "admin");
        assert_eq!(rotated.user_id, 7);
        assert_eq!(rotated.username, "alice");
    }

    #[tokio::test]
    async fn test_refresh_rejects_disabled_account() {
        let (engine, _) = engine(Ok(snapshot("admin", false)));
        assert_eq!(
            engine.refresh(&claims("common")).await,
            Err(AuthError::AccountDisabled)
        );
    }

    #[tokio::test]
    async fn test_failed_rotation_keeps_original_role() {
        // A TTL that cannot be represented as a timestamp makes issuance fail.
        let codec = Arc::new(TokenCodec::new(
            &AuthConfig::new("refresh-test-secret")
                .with_ttl(std::time::Duration::from_secs(u64::MAX)),
        ));
        let engine = RefreshEngine::new(codec, Arc::new(FixedStore(Ok(snapshot("admin", true)))));

        let outcome = engine.refresh(&claims("common")).await.unwrap();
        assert_eq!(outcome.role, "common");
        assert!(outcome.new_token.is_none());
    }
}
