//! Kudos application composition root
//!
//! Wires the store, email service, and domain router into a single
//! application.

use std::sync::Arc;

use axum::Router;
use kudos_email::{EmailConfig, EmailServiceFactory};
use kudos_leagues::{LeaguesState, PostgresStore};
use sqlx::PgPool;

/// Create the main application router with all routes and middleware
pub async fn create_app(pool: PgPool) -> Result<Router, anyhow::Error> {
    // Create the membership store and make sure its tables exist
    let store = PostgresStore::new(pool);
    store.migrate().await?;

    // Create email service from environment
    let email_config = EmailConfig::from_env()?;
    let email_service = EmailServiceFactory::create(email_config).await?;

    // Create leagues domain state
    let leagues_state = LeaguesState::new(Arc::new(store), Arc::from(email_service));

    // Build router — compose domain routers with shared infrastructure routes
    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/", axum::routing::get(|| async { "Kudos API v0.1.0" }))
        .merge(kudos_leagues::routes().with_state(leagues_state));

    Ok(app)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
