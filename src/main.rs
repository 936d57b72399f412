// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Utogsykle API Server
//!
//! Workplace activity challenges: log activities, keep streaks and compete
//! with colleagues.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utogsykle::{
    authz::RoleAuthorizer,
    clock::SystemClock,
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, Store},
    services::LogInvitationSender,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        "Starting Utogsykle API"
    );

    let db: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let sender = Arc::new(LogInvitationSender::new(config.frontend_url.clone()));

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        Arc::new(SystemClock),
        Arc::new(RoleAuthorizer),
        sender,
    ));

    // Build router
    let app = utogsykle::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("utogsykle=debug,info")),
        )
        .with(format)
        .init();
}
