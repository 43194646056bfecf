//! Voucher preview handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{VoucherCheckRequest, VoucherCheckResponse};
use crate::app_state::AppState;
use crate::error::{ApiError, ErrorResponse};

/// `POST /vouchers/check` — Preview a voucher against an event.
///
/// A rejected voucher is a normal `200` answer with `valid: false`.
///
/// # Errors
///
/// Returns [`ApiError::EventNotFound`] for an unknown event.
#[utoipa::path(
    post,
    path = "/api/v1/vouchers/check",
    tag = "Vouchers",
    summary = "Check a voucher",
    description = "Validates a voucher code for an event and returns the resulting price. Read-only: no usage is recorded.",
    request_body = VoucherCheckRequest,
    responses(
        (status = 200, description = "Voucher verdict and price", body = VoucherCheckResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn check_voucher(
    State(state): State<AppState>,
    Json(req): Json<VoucherCheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = state
        .booking_service
        .check_voucher(&req.code, req.event_id)
        .await?;
    Ok(Json(VoucherCheckResponse::from(quote)))
}

/// Voucher routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/vouchers/check", post(check_voucher))
}
