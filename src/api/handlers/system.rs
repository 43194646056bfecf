//! Liveness endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Open WebSocket connections listening for booking updates.
    pub live_subscribers: usize,
    /// Server time.
    pub checked_at: DateTime<Utc>,
}

/// `GET /health`.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        live_subscribers: state.update_bus.receiver_count(),
        checked_at: Utc::now(),
    })
}

/// Root-level routes, outside `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
