//! In-memory store backend.
//!
//! All tables sit behind one [`tokio::sync::Mutex`]. Every operation,
//! including a full settlement, runs while holding it, which gives the
//! same guarantees as serial execution of the equivalent SQL
//! transactions. Used by the test-suite and for local development.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::BookingStore;
use crate::domain::event::has_capacity;
use crate::domain::voucher::normalize_code;
use crate::domain::{
    Booking, BookingStatus, Event, OrderId, PaymentRecord, ReviewReason, SettlementCommand,
    SettlementOutcome, Voucher,
};
use crate::error::ApiError;

/// Fixture format accepted by [`MemoryStore::from_seed_file`].
#[derive(Debug, Default, Deserialize)]
pub struct StoreSeed {
    /// Events to preload.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Vouchers to preload.
    #[serde(default)]
    pub vouchers: Vec<Voucher>,
}

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    vouchers: HashMap<String, Voucher>,
    bookings: HashMap<OrderId, Booking>,
    payments: HashMap<OrderId, PaymentRecord>,
}

/// Mutex-serialized in-memory implementation of [`BookingStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `seed`.
    #[must_use]
    pub fn with_seed(seed: StoreSeed) -> Self {
        let mut tables = Tables::default();
        for event in seed.events {
            tables.events.insert(event.id, event);
        }
        for mut voucher in seed.vouchers {
            voucher.code = normalize_code(&voucher.code);
            tables.vouchers.insert(voucher.code.clone(), voucher);
        }
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Loads a JSON [`StoreSeed`] fixture from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the file cannot be read or parsed.
    pub async fn from_seed_file(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Internal(format!("reading {}: {e}", path.display())))?;
        let seed: StoreSeed = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Internal(format!("parsing {}: {e}", path.display())))?;
        tracing::info!(
            events = seed.events.len(),
            vouchers = seed.vouchers.len(),
            path = %path.display(),
            "in-memory store seeded"
        );
        Ok(Self::with_seed(seed))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, ApiError> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn insert_event(&self, event: &Event) -> Result<(), ApiError> {
        self.tables
            .lock()
            .await
            .events
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn find_voucher(&self, code: &str) -> Result<Option<Voucher>, ApiError> {
        let code = normalize_code(code);
        Ok(self.tables.lock().await.vouchers.get(&code).cloned())
    }

    async fn insert_voucher(&self, voucher: &Voucher) -> Result<(), ApiError> {
        let mut voucher = voucher.clone();
        voucher.code = normalize_code(&voucher.code);
        self.tables
            .lock()
            .await
            .vouchers
            .insert(voucher.code.clone(), voucher);
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), ApiError> {
        let mut tables = self.tables.lock().await;
        if tables.bookings.contains_key(&booking.order_id) {
            return Err(ApiError::Persistence(format!(
                "duplicate order_id {}",
                booking.order_id
            )));
        }
        tables
            .bookings
            .insert(booking.order_id.clone(), booking.clone());
        Ok(())
    }

    async fn find_booking(&self, order_id: &OrderId) -> Result<Option<Booking>, ApiError> {
        Ok(self.tables.lock().await.bookings.get(order_id).cloned())
    }

    async fn upsert_payment(&self, record: &PaymentRecord) -> Result<(), ApiError> {
        let mut tables = self.tables.lock().await;
        match tables.payments.get_mut(&record.order_id) {
            Some(existing) => {
                existing.status.clone_from(&record.status);
                existing.channel.clone_from(&record.channel);
                existing.gross_amount = record.gross_amount;
                existing.raw = record.raw.clone();
                existing.updated_at = record.updated_at;
            }
            None => {
                tables
                    .payments
                    .insert(record.order_id.clone(), record.clone());
            }
        }
        Ok(())
    }

    async fn find_payment(&self, order_id: &OrderId) -> Result<Option<PaymentRecord>, ApiError> {
        Ok(self.tables.lock().await.payments.get(order_id).cloned())
    }

    async fn settle_payment(
        &self,
        order_id: &OrderId,
        command: SettlementCommand,
    ) -> Result<SettlementOutcome, ApiError> {
        let mut tables = self.tables.lock().await;
        settle_locked(&mut tables, order_id, command)
    }
}

/// Settlement body; runs with the table lock held.
fn settle_locked(
    tables: &mut Tables,
    order_id: &OrderId,
    command: SettlementCommand,
) -> Result<SettlementOutcome, ApiError> {
    let Tables {
        events,
        vouchers,
        bookings,
        ..
    } = tables;
    let booking = bookings
        .get_mut(order_id)
        .ok_or_else(|| ApiError::BookingNotFound(order_id.to_string()))?;
    let now = Utc::now();

    match command {
        SettlementCommand::Pay { amount_matches } => {
            if booking.status == BookingStatus::Paid {
                return Ok(SettlementOutcome::AlreadyPaid);
            }
            if !amount_matches {
                booking.status = BookingStatus::Review;
                booking.updated_at = now;
                return Ok(SettlementOutcome::Review {
                    reason: ReviewReason::AmountMismatch,
                });
            }
            let event = events.get_mut(&booking.event_id).ok_or_else(|| {
                ApiError::Internal(format!("event {} missing for booking", booking.event_id))
            })?;
            if !has_capacity(event.booth_quota, event.booth_sold_count) {
                booking.status = BookingStatus::Review;
                booking.updated_at = now;
                return Ok(SettlementOutcome::Review {
                    reason: ReviewReason::QuotaExhausted,
                });
            }

            booking.status = BookingStatus::Paid;
            booking.paid_at = Some(now);
            booking.updated_at = now;
            event.booth_sold_count += 1;

            if let Some(code) = booking.voucher_code.as_deref() {
                match vouchers.get_mut(code) {
                    Some(voucher) if voucher.can_consume() => voucher.used_count += 1,
                    _ => tracing::warn!(%order_id, code, "voucher usage not counted"),
                }
            }
            Ok(SettlementOutcome::Paid)
        }
        SettlementCommand::FraudReview => {
            if booking.status == BookingStatus::Paid {
                return Ok(SettlementOutcome::Ignored {
                    current: BookingStatus::Paid,
                });
            }
            booking.status = BookingStatus::Review;
            booking.updated_at = now;
            Ok(SettlementOutcome::Review {
                reason: ReviewReason::FraudChallenge,
            })
        }
        SettlementCommand::Fail => {
            if !booking.status.accepts_failure() {
                return Ok(SettlementOutcome::Ignored {
                    current: booking.status,
                });
            }
            booking.status = BookingStatus::Failed;
            booking.updated_at = now;
            Ok(SettlementOutcome::Failed)
        }
    }
}
