//! Persistence layer: the booking repository interface and its backends.
//!
//! [`BookingStore`] is the only way the services touch durable state.
//! All cross-request coordination happens inside the store through
//! transactions and guarded writes; no handler holds shared mutable
//! state of its own.
//!
//! Two backends implement the trait:
//!
//! - [`PostgresStore`] for production, using `SERIALIZABLE` transactions.
//! - [`MemoryStore`] for tests and local development, serialized by a
//!   single mutex.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{
    Booking, Event, OrderId, PaymentRecord, SettlementCommand, SettlementOutcome, Voucher,
};
use crate::error::ApiError;

/// Repository interface for events, vouchers, bookings and payments.
///
/// Event and voucher writes exist for seeding and administration; the
/// booking core only reads them. Counter columns (`booth_sold_count`,
/// `used_count`) are mutated exclusively by [`BookingStore::settle_payment`].
#[async_trait]
pub trait BookingStore: Send + Sync + std::fmt::Debug {
    /// Fetches an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, ApiError>;

    /// Inserts or replaces an event.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn insert_event(&self, event: &Event) -> Result<(), ApiError>;

    /// Fetches a voucher by code. Implementations normalize `code` with
    /// [`crate::domain::voucher::normalize_code`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn find_voucher(&self, code: &str) -> Result<Option<Voucher>, ApiError>;

    /// Inserts or replaces a voucher.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn insert_voucher(&self, voucher: &Voucher) -> Result<(), ApiError>;

    /// Persists a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure or an
    /// `order_id` collision.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), ApiError>;

    /// Fetches a booking by order id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn find_booking(&self, order_id: &OrderId) -> Result<Option<Booking>, ApiError>;

    /// Records the latest gateway view of an order. One row per
    /// `order_id`; later calls overwrite status, channel, amount and raw
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn upsert_payment(&self, record: &PaymentRecord) -> Result<(), ApiError>;

    /// Fetches the payment audit row for an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] on storage failure.
    async fn find_payment(&self, order_id: &OrderId) -> Result<Option<PaymentRecord>, ApiError>;

    /// Applies a settlement command atomically.
    ///
    /// For [`SettlementCommand::Pay`] the whole step runs in one
    /// serializable unit: amount check, quota re-check, guarded
    /// `PAID` update, conditional quota increment (falling back to
    /// `REVIEW` if the race was lost) and conditional voucher increment.
    /// A booking already `PAID` is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BookingNotFound`] for an unknown order and
    /// [`ApiError::Persistence`] on storage failure. Replaying the same
    /// command after an error is always safe.
    async fn settle_payment(
        &self,
        order_id: &OrderId,
        command: SettlementCommand,
    ) -> Result<SettlementOutcome, ApiError>;
}

/// Shared handle to a store backend.
pub type SharedStore = Arc<dyn BookingStore>;
