//! Configuration
//! Mission: Load process-wide settings once at startup and hand them out explicitly

use anyhow::{bail, Result};
use clap::Parser;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Tokens live for 30 minutes unless overridden
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Issuer stamped into (and required from) every token
pub const DEFAULT_ISSUER: &str = "myapp";

const DEV_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Signing settings shared by the token codec and the request gate.
#[derive(Clone)]
pub struct AuthConfig {
    pub signing_secret: String,
    pub token_ttl: Duration,
    pub issuer: String,
}

impl AuthConfig {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.signing_secret.trim().is_empty() {
            bail!("signing secret must not be empty");
        }
        if self.token_ttl.is_zero() {
            bail!("token TTL must be greater than zero");
        }
        if self.issuer.trim().is_empty() {
            bail!("token issuer must not be empty");
        }
        Ok(())
    }
}

// The secret never reaches the logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Command line / environment settings for the `gatekeeper` binary
#[derive(Parser, Debug, Clone)]
#[command(name = "gatekeeper")]
#[command(about = "User management API with per-request authorization refresh")]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[arg(long = "bind", env = "GATE_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// SQLite database holding user accounts
    #[arg(long, env = "AUTH_DB_PATH", default_value = "gatekeeper_auth.db")]
    pub db_path: String,

    /// HMAC secret used to sign session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in minutes
    #[arg(long, env = "TOKEN_TTL_MINUTES", default_value = "30")]
    pub token_ttl_minutes: u64,

    /// Issuer claim written into and required from tokens
    #[arg(long, env = "TOKEN_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,

    /// Password for the admin account seeded into an empty database
    #[arg(long, env = "ADMIN_BOOTSTRAP_PASSWORD", default_value = "admin123", hide_env_values = true)]
    pub admin_password: String,
}

impl ServerConfig {
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let secret = match &self.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("⚠️  JWT_SECRET not set, using development secret. CHANGE IN PRODUCTION!");
                DEV_SECRET.to_string()
            }
        };

        let config = AuthConfig::new(secret)
            .with_ttl(Duration::from_secs(self.token_ttl_minutes * 60))
            .with_issuer(self.issuer.clone());
        config.validate()?;
        Ok(config)
    }
}

/// Load `.env` from the working directory (and parents), then from the crate root.
pub fn load_env() {
    let _ = dotenv::dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
