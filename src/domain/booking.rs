//! Booth bookings and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::OrderId;

/// Lifecycle state of a booking.
///
/// ```text
/// PENDING ──► PAID      (terminal for settlement)
///    │  ──► REVIEW ──┐
///    └──► FAILED ◄───┘  (REVIEW/FAILED may still move on later notifications)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, awaiting payment.
    Pending,
    /// Payment settled; quota and voucher usage consumed.
    Paid,
    /// Needs manual resolution (amount mismatch, oversell, fraud challenge).
    Review,
    /// Payment denied, cancelled, expired or reversed.
    Failed,
    /// Administratively cancelled.
    Cancelled,
    /// Swept after the payment window lapsed.
    Expired,
}

impl BookingStatus {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Review => "REVIEW",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Parses the persisted string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "REVIEW" => Some(Self::Review),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            "EXPIRED" => Some(Self::Expired),
            _ => None,
        }
    }

    /// States a failure notification is allowed to overwrite.
    #[must_use]
    pub const fn accepts_failure(&self) -> bool {
        matches!(self, Self::Pending | Self::Review | Self::Failed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exhibitor contact details. Carried through to the gateway's customer
/// details but otherwise opaque to settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactDetails {
    /// Contact person.
    pub name: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Exhibiting institution or company.
    #[serde(default)]
    pub company: Option<String>,
    /// Free-form notes from the exhibitor.
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContactDetails {
    /// Checks that the required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `(field, message)` for the first invalid field.
    pub fn validate(&self) -> Result<(), (&'static str, &'static str)> {
        if self.name.trim().is_empty() {
            return Err(("name", "name is required"));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(("email", "a valid email is required"));
        }
        if self.phone.trim().is_empty() {
            return Err(("phone", "phone is required"));
        }
        Ok(())
    }
}

/// A booth booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Row identifier.
    pub id: Uuid,
    /// Unique correlation key shared with the payment gateway.
    pub order_id: OrderId,
    /// Booked event.
    pub event_id: Uuid,
    /// Price before discount, captured at booking time.
    pub base_price: i64,
    /// Discount granted by the voucher.
    pub discount: i64,
    /// Final payable amount.
    pub amount: i64,
    /// Voucher applied, if any (normalized code).
    pub voucher_code: Option<String>,
    /// Current lifecycle state.
    pub status: BookingStatus,
    /// Contact details.
    pub contact: ContactDetails,
    /// Settlement timestamp.
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a new `PENDING` booking.
    #[must_use]
    pub fn pending(
        event_id: Uuid,
        base_price: i64,
        discount: i64,
        voucher_code: Option<String>,
        contact: ContactDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id: OrderId::generate(),
            event_id,
            base_price,
            discount,
            amount: super::voucher::payable_amount(base_price, discount),
            voucher_code,
            status: BookingStatus::Pending,
            contact,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
