//! Booking DTOs for create and status query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, ContactDetails};
use crate::gateway::PaymentSession;
use crate::service::{CreatedBooking, NewBooking};

/// Request body for `POST /api/v1/bookings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Event to book a booth at.
    pub event_id: Uuid,
    /// Contact person.
    pub name: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Exhibiting institution.
    #[serde(default)]
    pub company: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Optional voucher code.
    #[serde(default)]
    pub voucher_code: Option<String>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            event_id: req.event_id,
            contact: ContactDetails {
                name: req.name,
                email: req.email,
                phone: req.phone,
                company: req.company,
                notes: req.notes,
            },
            voucher_code: req.voucher_code,
        }
    }
}

/// Response body for `POST /api/v1/bookings` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateBookingResponse {
    /// Correlation key for payment and status queries.
    pub order_id: String,
    /// Always `PENDING` on creation.
    pub status: BookingStatus,
    /// Booth price before discount.
    pub base_price: i64,
    /// Discount granted by the voucher.
    pub discount: i64,
    /// Payable amount.
    pub amount: i64,
    /// Applied voucher code, normalized.
    pub voucher_code: Option<String>,
    /// Payment session; `null` when nothing is payable.
    pub payment: Option<PaymentSession>,
}

impl From<CreatedBooking> for CreateBookingResponse {
    fn from(created: CreatedBooking) -> Self {
        let CreatedBooking { booking, payment } = created;
        Self {
            order_id: booking.order_id.into(),
            status: booking.status,
            base_price: booking.base_price,
            discount: booking.discount,
            amount: booking.amount,
            voucher_code: booking.voucher_code,
            payment,
        }
    }
}

/// Booking state for `GET /api/v1/bookings/{order_id}` and the WebSocket
/// `get_booking` command.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingView {
    /// Correlation key.
    pub order_id: String,
    /// Booked event.
    pub event_id: Uuid,
    /// Current lifecycle state.
    pub status: BookingStatus,
    /// Booth price before discount.
    pub base_price: i64,
    /// Discount granted.
    pub discount: i64,
    /// Payable amount.
    pub amount: i64,
    /// Applied voucher code.
    pub voucher_code: Option<String>,
    /// Settlement timestamp.
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingView {
    fn from(booking: &Booking) -> Self {
        Self {
            order_id: booking.order_id.to_string(),
            event_id: booking.event_id,
            status: booking.status,
            base_price: booking.base_price,
            discount: booking.discount,
            amount: booking.amount,
            voucher_code: booking.voucher_code.clone(),
            paid_at: booking.paid_at,
            created_at: booking.created_at,
        }
    }
}
