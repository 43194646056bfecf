//! Booking handlers: create and status query.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{BookingView, CreateBookingRequest, CreateBookingResponse};
use crate::app_state::AppState;
use crate::domain::OrderId;
use crate::error::{ApiError, ErrorResponse};

/// `POST /bookings` — Create a booth booking.
///
/// # Errors
///
/// Returns [`ApiError`] on validation failure, unknown or sold-out
/// events, rejected vouchers, or when the payment gateway is unreachable.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booth booking",
    description = "Prices the booth (applying an optional voucher), stores a PENDING booking and opens a payment session. Quota is checked here but only consumed when payment settles.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = CreateBookingResponse),
        (status = 400, description = "Invalid field, unpublished event or rejected voucher", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event sold out", body = ErrorResponse),
        (status = 502, description = "Booking stored but the payment gateway failed", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.booking_service.create_booking(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse::from(created)),
    ))
}

/// `GET /bookings/{order_id}` — Current booking state.
///
/// # Errors
///
/// Returns [`ApiError::BookingNotFound`] for an unknown order id.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{order_id}",
    tag = "Bookings",
    summary = "Get booking status",
    params(
        ("order_id" = String, Path, description = "Booking order id"),
    ),
    responses(
        (status = 200, description = "Booking state", body = BookingView),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .booking_service
        .get_booking(&OrderId::from_string(order_id))
        .await?;
    Ok(Json(BookingView::from(&booking)))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{order_id}", get(get_booking))
}
