//! Exhibition events and their booth quota ledger.
//!
//! The ledger is the `(booth_quota, booth_sold_count)` pair. Booking
//! creation only consults it ([`Event::has_capacity`]) to fail fast; the
//! authoritative check-and-increment happens inside the settlement
//! transaction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event that sells booth space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Row identifier.
    pub id: Uuid,
    /// Display title, carried into the payment line item.
    #[serde(default)]
    pub title: String,
    /// Unpublished events cannot be booked.
    pub is_published: bool,
    /// Booth price in minor currency units.
    pub booth_price: i64,
    /// Booth capacity; `None` = unlimited.
    #[serde(default)]
    pub booth_quota: Option<i64>,
    /// Booths consumed by paid bookings.
    #[serde(default)]
    pub booth_sold_count: i64,
}

impl Event {
    /// Returns `true` while at least one booth remains unsold.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        has_capacity(self.booth_quota, self.booth_sold_count)
    }

    /// Booths still available, or `None` for unlimited events.
    #[must_use]
    pub fn remaining(&self) -> Option<i64> {
        self.booth_quota
            .map(|quota| quota.saturating_sub(self.booth_sold_count).max(0))
    }
}

/// Ledger rule shared by the advisory and the authoritative checks.
#[must_use]
pub fn has_capacity(quota: Option<i64>, sold_count: i64) -> bool {
    quota.is_none_or(|quota| sold_count < quota)
}
