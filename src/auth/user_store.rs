//! User Storage
//! Mission: Read live account state for the gate and manage accounts in SQLite

use crate::auth::error::StoreError;
use crate::auth::models::{AccountSnapshot, User, ADMIN_ROLE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const STATUS_ENABLED: &str = "enabled";
const STATUS_DISABLED: &str = "disabled";

const USER_COLUMNS: &str = "id, username, password_hash, role, status, last_login";

/// Point lookup of current account state. Implementations must never cache:
/// disabling an account has to take effect on the very next request.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn lookup_by_id(&self, id: i64) -> Result<AccountSnapshot, StoreError>;
}

/// User storage with SQLite backend
pub struct SqliteUserStore {
    db_path: PathBuf,
    bcrypt_cost: u32,
}

impl SqliteUserStore {
    /// Open (creating if needed) the user database
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
            bcrypt_cost: DEFAULT_COST,
        };
        store.init_db()?;
        Ok(store)
    }

    /// Override the bcrypt work factor (tests use the minimum of 4).
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.db_path)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = self
            .connect()
            .with_context(|| format!("Failed to open user db at {}", self.db_path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'common',
                status TEXT NOT NULL DEFAULT 'enabled',
                last_login TEXT
            )",
            [],
        )
        .context("Failed to create users table")?;

        Ok(())
    }

    /// Create the bootstrap admin account if no admin exists yet
    pub fn seed_default_admin(&self, password: &str) -> Result<Option<User>> {
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = ?1",
                params![ADMIN_ROLE],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count > 0 {
            return Ok(None);
        }

        let admin = self.create_user("admin", password, ADMIN_ROLE)?;
        info!("🔐 Default admin user created (username: admin)");
        warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        Ok(Some(admin))
    }

    /// Create a new enabled user
    pub fn create_user(&self, username: &str, password: &str, role: &str) -> Result<User> {
        let password_hash =
            hash(password, self.bcrypt_cost).context("Failed to hash password")?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (username, password_hash, role, status) VALUES (?1, ?2, ?3, ?4)",
            params![username, password_hash, role, STATUS_ENABLED],
        )
        .with_context(|| format!("Failed to insert user {username}"))?;

        let id = conn.last_insert_rowid();
        info!(user_id = id, role, "✅ Created user: {}", username);

        Ok(User {
            id,
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
            enabled: true,
            last_login: None,
        })
    }

    /// Get user by username
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connect()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by id
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.connect()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Check a plaintext password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        verify(password, &user.password_hash).context("Failed to verify password")
    }

    /// Change a user's role; the gate rotates that user's token on their next request
    pub fn set_role(&self, id: i64, role: &str) -> Result<()> {
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role, id],
        )?;
        if rows == 0 {
            anyhow::bail!("User not found");
        }
        info!(user_id = id, role, "Role changed");
        Ok(())
    }

    /// Enable or disable an account; disabling locks the user out immediately
    pub fn set_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        let status = if enabled { STATUS_ENABLED } else { STATUS_DISABLED };
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE users SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        if rows == 0 {
            anyhow::bail!("User not found");
        }
        info!(user_id = id, status, "Account status changed");
        Ok(())
    }

    /// Replace a user's password
    pub fn set_password(&self, id: i64, password: &str) -> Result<()> {
        let password_hash =
            hash(password, self.bcrypt_cost).context("Failed to hash password")?;
        let conn = self.connect()?;
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        if rows == 0 {
            anyhow::bail!("User not found");
        }
        info!(user_id = id, "Password changed");
        Ok(())
    }

    /// Delete a user by ID. Returns false when no such user exists.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if rows > 0 {
            info!(user_id = id, "🗑️  Deleted user");
        }
        Ok(rows > 0)
    }

    /// Record a successful login
    pub fn touch_last_login(&self, id: i64) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}

#[async_trait]
impl UserLookup for SqliteUserStore {
    async fn lookup_by_id(&self, id: i64) -> Result<AccountSnapshot, StoreError> {
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || fetch_snapshot(&db_path, id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

fn fetch_snapshot(db_path: &Path, id: i64) -> Result<AccountSnapshot, StoreError> {
    let conn = Connection::open(db_path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

    let row = conn
        .query_row(
            "SELECT id, role, status FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(AccountSnapshot {
                    id: row.get(0)?,
                    role: row.get(1)?,
                    enabled: row.get::<_, String>(2)? == STATUS_ENABLED,
                })
            },
        )
        .optional()
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    row.ok_or(StoreError::NotFound(id))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        enabled: row.get::<_, String>(4)? == STATUS_ENABLED,
        last_login: row.get(5)?,
    })
}
