//! booth-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use booth_gateway::api;
use booth_gateway::app_state::AppState;
use booth_gateway::config::AppConfig;
use booth_gateway::domain::UpdateBus;
use booth_gateway::gateway::SnapClient;
use booth_gateway::store::{MemoryStore, PostgresStore, SharedStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting booth-gateway");

    // Build store
    let store: SharedStore = if config.persistence_enabled {
        Arc::new(PostgresStore::connect(&config).await?)
    } else {
        tracing::warn!("persistence disabled, using in-memory store");
        match &config.store_seed_path {
            Some(path) => Arc::new(MemoryStore::from_seed_file(path).await?),
            None => Arc::new(MemoryStore::new()),
        }
    };

    // Build services
    let gateway = Arc::new(SnapClient::new(config.payment.clone())?);
    let update_bus = UpdateBus::new(config.update_bus_capacity);
    let app_state = AppState::new(store, gateway, &config.payment, update_bus);

    // Build router
    let app = api::build_app(app_state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
