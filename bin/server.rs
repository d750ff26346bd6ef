// Finance Tracker - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use finance_tracker::{build_router, open_database, AppState, ServerConfig, TokenIssuer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    // Signing key and ttl are fatal at startup, never per request
    let tokens = TokenIssuer::new(config.signing_key()?, config.token_ttl()?)?;

    let conn = open_database(&config.database)?;
    tracing::info!(database = %config.database.display(), "database opened");

    let token_ttl_days = tokens.ttl().num_days();
    let app = build_router(AppState::new(conn, tokens));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        addr = %config.bind,
        token_ttl_days,
        "finance tracker listening"
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
