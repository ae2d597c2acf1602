//! JWT Token Codec
//! Mission: Issue and verify HMAC-signed session tokens

use crate::auth::error::TokenError;
use crate::auth::models::Claims;
use crate::config::AuthConfig;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::time::Duration;
use tracing::debug;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Signs and verifies session tokens with a process-wide secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    issuer: String,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            ttl: config.token_ttl,
            issuer: config.issuer.clone(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token valid for the configured TTL starting now.
    pub fn issue(&self, user_id: i64, username: &str, role: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, username, role, Utc::now())
    }

    /// Issue a token as if it had been minted at `issued_at`.
    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(self.ttl.as_secs())
            .map_err(|_| TokenError::Issuance("token TTL out of range".to_string()))?;

        let claims = Claims {
            user_id,
            username: username.to_string(),
            role: role.to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs),
            iss: self.issuer.clone(),
        };

        debug!(user_id, role, "Issuing token");

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Issuance(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// Checks run in this order:
    /// 1. the header names an HMAC algorithm (`none` and asymmetric algorithms are refused)
    /// 2. the claims parse, carry our issuer and are not expired
    /// 3. the signature matches the secret
    ///
    /// so an expired token reports [`TokenError::Expired`] whatever its signature.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        check_algorithm(token)?;

        let mut unsigned = self.validation();
        unsigned.insecure_disable_signature_validation();
        decode::<Claims>(token, &self.decoding_key, &unsigned).map_err(classify)?;

        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation()).map_err(classify)?;

        Ok(data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation
    }
}

/// Read the `alg` field from the token header before handing the token to
/// the decoder, which cannot represent `none` at all.
fn check_algorithm(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header.trim_end_matches('='))
        .map_err(|_| TokenError::Malformed)?;
    let header: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;
    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .ok_or(TokenError::Malformed)?;

    match alg {
        "HS256" | "HS384" | "HS512" => Ok(()),
        other => {
            debug!(alg = other, "Rejecting token with non-HMAC algorithm");
            Err(TokenError::AlgorithmMismatch)
        }
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::AlgorithmMismatch
        }
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&AuthConfig::new(secret))
    }

    fn b64(value: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&value).unwrap())
    }

    fn payload(exp_offset_secs: i64) -> serde_json::Value {
        let now = Utc::now().timestamp();
        serde_json::json!({
            "id": 7,
            "username": "alice",
            "role": "common",
            "iat": now,
            "exp": now + exp_offset_secs,
            "iss": "myapp",
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec("test-secret-key-12345");
        let token = codec.issue(7, "alice", "common").unwrap();
        assert!(!token.is_empty());

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "common");
        assert_eq!(claims.iss, "myapp");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let codec = codec("test-secret-key-12345");
        let token = codec.issue(7, "alice", "common").unwrap();

        assert_eq!(codec.verify(&token).unwrap(), codec.verify(&token).unwrap());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec("test-secret-key-12345");
        let token = codec
            .issue_at(7, "alice", "common", Utc::now() - ChronoDuration::hours(2))
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_token_with_bad_signature_reports_expiry() {
        let token = codec("other-secret")
            .issue_at(7, "alice", "common", Utc::now() - ChronoDuration::hours(2))
            .unwrap();

        assert_eq!(
            codec("test-secret-key-12345").verify(&token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_different_secrets_reject() {
        let token = codec("secret1").issue(7, "alice", "common").unwrap();
        assert_eq!(
            codec("secret2").verify(&token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec("test-secret-key-12345");
        let token = codec.issue(7, "alice", "common").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut escalated = payload(600);
        escalated["role"] = "admin".into();
        let forged = format!("{}.{}.{}", parts[0], b64(escalated), parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let token = format!(
            "{}.{}.",
            b64(serde_json::json!({"alg": "none", "typ": "JWT"})),
            b64(payload(600))
        );
        assert_eq!(
            codec("test-secret-key-12345").verify(&token),
            Err(TokenError::AlgorithmMismatch)
        );
    }

    #[test]
    fn test_asymmetric_algorithm_rejected() {
        for alg in ["RS256", "ES256", "PS512", "EdDSA"] {
            let token = format!(
                "{}.{}.c2lnbmF0dXJl",
                b64(serde_json::json!({"alg": alg, "typ": "JWT"})),
                b64(payload(600))
            );
            assert_eq!(
                codec("test-secret-key-12345").verify(&token),
                Err(TokenError::AlgorithmMismatch),
                "alg {alg} must be refused"
            );
        }
    }

    #[test]
    fn test_other_hmac_algorithms_accepted() {
        let secret = "test-secret-key-12345";
        let claims = Claims {
            user_id: 7,
            username: "alice".to_string(),
            role: "common".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
            iss: "myapp".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec(secret).verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = codec("test-secret-key-12345");
        for token in ["", "abc123", "invalid.token.here", "a.b", "a.b.c.d"] {
            assert_eq!(codec.verify(token), Err(TokenError::Malformed), "{token:?}");
        }
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let secret = "test-secret-key-12345";
        let foreign = TokenCodec::new(&AuthConfig::new(secret).with_issuer("elsewhere"))
            .issue(7, "alice", "common")
            .unwrap();

        assert_eq!(codec(secret).verify(&foreign), Err(TokenError::Malformed));
    }

    #[test]
    fn test_custom_ttl() {
        let codec = TokenCodec::new(
            &AuthConfig::new("test-secret-key-12345").with_ttl(Duration::from_secs(90)),
        );
        let claims = codec.verify(&codec.issue(1, "bob", "admin").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 90);
    }
}
