//! Notifications about booking state changes.
//!
//! Published on the [`super::UpdateBus`] after the durable write has
//! committed and fanned out to WebSocket subscribers. They are advisory;
//! the store remains the source of truth.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{BookingStatus, OrderId, ReviewReason};

/// Booking change broadcast to live subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BookingUpdate {
    /// Emitted after a booking is persisted.
    BookingCreated {
        /// Booking correlation key.
        order_id: OrderId,
        /// Booked event.
        event_id: Uuid,
        /// Payable amount.
        amount: i64,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when settlement changes a booking's status.
    BookingStatusChanged {
        /// Booking correlation key.
        order_id: OrderId,
        /// New status.
        status: BookingStatus,
        /// Set when the new status is `REVIEW`.
        #[serde(skip_serializing_if = "Option::is_none")]
        review_reason: Option<ReviewReason>,
        /// Transition timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl BookingUpdate {
    /// Returns the order id the update refers to.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::BookingCreated { order_id, .. } | Self::BookingStatusChanged { order_id, .. } => {
                order_id
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::BookingCreated { .. } => "booking_created",
            Self::BookingStatusChanged { .. } => "booking_status_changed",
        }
    }
}
