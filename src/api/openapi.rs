//! OpenAPI document and documentation routes.

use axum::Router;
use utoipa::OpenApi;

use super::dto::{
    BookingView, CreateBookingRequest, CreateBookingResponse, NotificationAck,
    VoucherCheckRequest, VoucherCheckResponse,
};
use super::handlers;
use crate::app_state::AppState;
use crate::domain::{BookingStatus, VoucherRejection};
use crate::error::{ErrorBody, ErrorResponse};
use crate::gateway::PaymentSession;

/// Path the OpenAPI JSON document is served at.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "booth-gateway",
        description = "Booth booking and payment reconciliation service"
    ),
    paths(
        handlers::booking::create_booking,
        handlers::booking::get_booking,
        handlers::voucher::check_voucher,
        handlers::webhook::payment_notification,
        handlers::system::health,
    ),
    components(schemas(
        CreateBookingRequest,
        CreateBookingResponse,
        BookingView,
        BookingStatus,
        PaymentSession,
        VoucherCheckRequest,
        VoucherCheckResponse,
        VoucherRejection,
        NotificationAck,
        ErrorResponse,
        ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Bookings", description = "Booth booking creation and status"),
        (name = "Vouchers", description = "Voucher price preview"),
        (name = "Payments", description = "Payment gateway notifications"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Documentation routes: the JSON document and, with the `swagger-ui`
/// feature, the interactive UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()),
    )
}

/// Documentation routes: the JSON document only.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    Router::new().route(
        OPENAPI_PATH,
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
