//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; health and API docs
//! sit at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(openapi::routes())
}

/// REST routes plus the `/ws` endpoint, bound to `state`. Transport
/// layers (tracing, CORS, timeouts) are added by the binary.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .route("/ws", get(ws_handler))
        .with_state(state)
}
