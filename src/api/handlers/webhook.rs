//! Payment gateway notification endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::NotificationAck;
use crate::app_state::AppState;
use crate::domain::PaymentNotification;
use crate::error::{ApiError, ErrorResponse};

/// `POST /payments/notification` — Gateway webhook.
///
/// Answers `200 {"message":"OK"}` for every authenticated notification,
/// whatever the booking outcome.
///
/// # Errors
///
/// Returns [`ApiError::InvalidSignature`] (401) without touching state,
/// [`ApiError::BookingNotFound`] (404) for unknown orders, and a 5xx on
/// storage failure so the gateway retries.
#[utoipa::path(
    post,
    path = "/api/v1/payments/notification",
    tag = "Payments",
    summary = "Payment notification webhook",
    description = "Verifies the notification signature, records the gateway view of the payment and settles the booking exactly once.",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Notification accepted", body = NotificationAck),
        (status = 400, description = "Malformed notification", body = ErrorResponse),
        (status = 401, description = "Invalid signature", body = ErrorResponse),
        (status = 404, description = "Unknown order", body = ErrorResponse),
        (status = 500, description = "Storage failure, retry", body = ErrorResponse),
    )
)]
pub async fn payment_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let raw: serde_json::Value = serde_json::from_slice(&body).map_err(|e| ApiError::InvalidRequest {
        message: format!("malformed JSON: {e}"),
        field: None,
    })?;
    let notification: PaymentNotification =
        serde_json::from_value(raw.clone()).map_err(|e| ApiError::InvalidRequest {
            message: format!("malformed notification: {e}"),
            field: None,
        })?;

    state.reconciler.reconcile(&notification, raw).await?;
    Ok(Json(NotificationAck::ok()))
}

/// Payment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments/notification", post(payment_notification))
}
