//! Gatekeeper - user management API server
//! Mission: Every request re-proves that its account is still active

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use gatekeeper_backend::{
    api,
    auth::{AuthState, GateState, SqliteUserStore, TokenCodec, UserLookup},
    config::{load_env, ServerConfig},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let args = ServerConfig::parse();
    let auth_config = args.auth_config()?;
    info!(?auth_config, "🔐 Authentication configured");

    let user_store = Arc::new(SqliteUserStore::open(&args.db_path)?);
    user_store.seed_default_admin(&args.admin_password)?;
    info!("🔐 User store initialized at: {}", args.db_path);

    let codec = Arc::new(TokenCodec::new(&auth_config));
    let lookup: Arc<dyn UserLookup> = user_store.clone();
    let gate = GateState::new(codec.clone(), lookup);
    let app = api::router(AuthState::new(user_store, codec), gate);

    let listener = TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind_addr))?;
    info!("🎯 API server listening on {}", args.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
