//! Authentication Models
//! Mission: Define the identity and token data that flows through the request gate

use serde::{Deserialize, Serialize};

/// Role with full user-management access
pub const ADMIN_ROLE: &str = "admin";

/// Role given to self-registered accounts
pub const DEFAULT_ROLE: &str = "common";

/// Token payload. The role here is only a hint; the store is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "id")]
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub iat: i64, // issued-at timestamp
    pub exp: i64, // expiration timestamp
    pub iss: String,
}

/// Live account state read from the user store on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub id: i64,
    pub role: String,
    pub enabled: bool,
}

/// Identity handed to downstream handlers once the gate has let a request through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "userID")]
    pub user_id: i64,
    pub role: String,
    pub username: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// User account row
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: String,
    pub enabled: bool,
    pub last_login: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response payload, also returned by registration
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: i64,
    pub username: String,
    pub role: String,
    pub expires_in: u64, // seconds
}

/// Self-registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Admin create-user request body
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

/// Partial user update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub enabled: Option<bool>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_wire_names() {
        let identity = Identity {
            user_id: 7,
            role: "common".to_string(),
            username: "alice".to_string(),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["userID"], 7);
        assert_eq!(json["role"], "common");
        assert_eq!(json["username"], "alice");
        assert!(!identity.is_admin());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$2b$hash".to_string(),
            role: ADMIN_ROLE.to_string(),
            enabled: true,
            last_login: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$hash"));
        assert_eq!(serde_json::to_value(&user).unwrap()["role"], "admin");
    }
}
