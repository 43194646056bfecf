//! PostgreSQL implementation of the booking store.
//!
//! The `PAID` path runs under `SERIALIZABLE` isolation so the quota
//! re-check and the quota increment are atomic with respect to any
//! concurrent settlement. Transactions aborted with a serialization
//! failure are retried from the top; every write inside is guarded, so a
//! replay can never double-apply.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::BookingStore;
use crate::config::AppConfig;
use crate::domain::event::has_capacity;
use crate::domain::voucher::normalize_code;
use crate::domain::{
    Booking, BookingStatus, ContactDetails, Event, OrderId, PaymentRecord, ReviewReason,
    SettlementCommand, SettlementOutcome, Voucher, VoucherType,
};
use crate::error::ApiError;

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Parks a non-`PAID` booking for manual review.
const MARK_FRAUD_REVIEW: &str = "UPDATE bookings SET status = 'REVIEW', updated_at = NOW() \
     WHERE order_id = $1 AND status <> 'PAID'";
/// Fails a booking that has not been paid.
const MARK_FAILED: &str = "UPDATE bookings SET status = 'FAILED', updated_at = NOW() \
     WHERE order_id = $1 AND status IN ('PENDING', 'REVIEW', 'FAILED')";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    max_retries: u32,
}

/// Why a single settlement attempt did not produce an outcome.
#[derive(Debug)]
enum AttemptError {
    NotFound,
    MissingEvent(Uuid),
    Db(sqlx::Error),
}

impl From<sqlx::Error> for AttemptError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err)
    }
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }

    /// Connects using the database settings in `config` and applies the
    /// bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Persistence`] if the connection or a migration
    /// fails.
    pub async fn connect(config: &AppConfig) -> Result<Self, ApiError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| ApiError::Persistence(format!("migration failed: {e}")))?;

        tracing::info!("database connected and migrated");
        Ok(Self::new(pool, config.settlement_max_retries))
    }

    /// Runs one settlement attempt for the `PAID` path.
    async fn try_pay(
        &self,
        order_id: &OrderId,
        amount_matches: bool,
    ) -> Result<SettlementOutcome, AttemptError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            "SELECT event_id, status, voucher_code FROM bookings WHERE order_id = $1",
        )
        .bind(order_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some((event_id, status, voucher_code)) = row else {
            tx.rollback().await?;
            return Err(AttemptError::NotFound);
        };

        if status == BookingStatus::Paid.as_str() {
            tx.commit().await?;
            return Ok(SettlementOutcome::AlreadyPaid);
        }

        if !amount_matches {
            return review(tx, order_id, ReviewReason::AmountMismatch).await;
        }

        let quota = sqlx::query_as::<_, (Option<i64>, i64)>(
            "SELECT booth_quota, booth_sold_count FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((booth_quota, sold_count)) = quota else {
            tx.rollback().await?;
            return Err(AttemptError::MissingEvent(event_id));
        };
        if !has_capacity(booth_quota, sold_count) {
            return review(tx, order_id, ReviewReason::QuotaExhausted).await;
        }

        let paid = sqlx::query(
            "UPDATE bookings SET status = 'PAID', paid_at = NOW(), updated_at = NOW() \
             WHERE order_id = $1 AND status <> 'PAID'",
        )
        .bind(order_id.as_str())
        .execute(&mut *tx)
        .await?;
        if paid.rows_affected() == 0 {
            tx.commit().await?;
            return Ok(SettlementOutcome::AlreadyPaid);
        }

        let incremented = sqlx::query(
            "UPDATE events SET booth_sold_count = booth_sold_count + 1, updated_at = NOW() \
             WHERE id = $1 AND (booth_quota IS NULL OR booth_sold_count < booth_quota)",
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
        if incremented.rows_affected() == 0 {
            sqlx::query(
                "UPDATE bookings SET status = 'REVIEW', paid_at = NULL, updated_at = NOW() \
                 WHERE order_id = $1",
            )
            .bind(order_id.as_str())
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok(SettlementOutcome::Review {
                reason: ReviewReason::QuotaExhausted,
            });
        }

        if let Some(code) = voucher_code {
            let used = sqlx::query(
                "UPDATE vouchers SET used_count = used_count + 1, updated_at = NOW() \
                 WHERE code = $1 AND is_active \
                 AND (max_uses IS NULL OR used_count < max_uses)",
            )
            .bind(&code)
            .execute(&mut *tx)
            .await?;
            if used.rows_affected() == 0 {
                tracing::warn!(%order_id, code = %code, "voucher usage not counted");
            }
        }

        tx.commit().await?;
        Ok(SettlementOutcome::Paid)
    }

    /// Applies a guarded single-row transition outside the `PAID` path.
    async fn guarded_transition(
        &self,
        order_id: &OrderId,
        sql: &'static str,
        outcome: SettlementOutcome,
    ) -> Result<SettlementOutcome, AttemptError> {
        let result = sqlx::query(sql)
            .bind(order_id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            return Ok(outcome);
        }

        let current =
            sqlx::query_scalar::<_, String>("SELECT status FROM bookings WHERE order_id = $1")
                .bind(order_id.as_str())
                .fetch_optional(&self.pool)
                .await?
                .ok_or(AttemptError::NotFound)?;
        Ok(SettlementOutcome::Ignored {
            current: parse_status(&current).map_err(AttemptError::Db)?,
        })
    }
}

/// Moves the booking to `REVIEW` unless it is `PAID`, then commits.
async fn review(
    mut tx: Transaction<'static, Postgres>,
    order_id: &OrderId,
    reason: ReviewReason,
) -> Result<SettlementOutcome, AttemptError> {
    let result = sqlx::query(
        "UPDATE bookings SET status = 'REVIEW', updated_at = NOW() \
         WHERE order_id = $1 AND status <> 'PAID'",
    )
    .bind(order_id.as_str())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    if result.rows_affected() == 0 {
        return Ok(SettlementOutcome::AlreadyPaid);
    }
    Ok(SettlementOutcome::Review { reason })
}

/// Returns `true` for errors that call for retrying the transaction.
fn is_retryable(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED)
}

fn parse_status(s: &str) -> Result<BookingStatus, sqlx::Error> {
    BookingStatus::parse(s)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown booking status {s:?}").into()))
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    is_published: bool,
    booth_price: i64,
    booth_quota: Option<i64>,
    booth_sold_count: i64,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            is_published: row.is_published,
            booth_price: row.booth_price,
            booth_quota: row.booth_quota,
            booth_sold_count: row.booth_sold_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VoucherRow {
    id: Uuid,
    code: String,
    #[sqlx(rename = "type")]
    voucher_type: String,
    value: i64,
    max_discount: Option<i64>,
    is_active: bool,
    max_uses: Option<i64>,
    used_count: i64,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    event_id: Option<Uuid>,
}

impl TryFrom<VoucherRow> for Voucher {
    type Error = sqlx::Error;

    fn try_from(row: VoucherRow) -> Result<Self, Self::Error> {
        let voucher_type = VoucherType::parse(&row.voucher_type).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown voucher type {:?}", row.voucher_type).into())
        })?;
        Ok(Self {
            id: row.id,
            code: row.code,
            voucher_type,
            value: row.value,
            max_discount: row.max_discount,
            is_active: row.is_active,
            max_uses: row.max_uses,
            used_count: row.used_count,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            event_id: row.event_id,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    order_id: String,
    event_id: Uuid,
    base_price: i64,
    discount: i64,
    amount: i64,
    voucher_code: Option<String>,
    status: String,
    contact_name: String,
    contact_email: String,
    contact_phone: String,
    company: Option<String>,
    notes: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = sqlx::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: OrderId::from_string(row.order_id),
            event_id: row.event_id,
            base_price: row.base_price,
            discount: row.discount,
            amount: row.amount,
            voucher_code: row.voucher_code,
            status: parse_status(&row.status)?,
            contact: ContactDetails {
                name: row.contact_name,
                email: row.contact_email,
                phone: row.contact_phone,
                company: row.company,
                notes: row.notes,
            },
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: String,
    status: String,
    channel: Option<String>,
    gross_amount: Option<i64>,
    raw: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            order_id: OrderId::from_string(row.order_id),
            status: row.status,
            channel: row.channel,
            gross_amount: row.gross_amount,
            raw: row.raw,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, ApiError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, title, is_published, booth_price, booth_quota, booth_sold_count \
             FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Event::from))
    }

    async fn insert_event(&self, event: &Event) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO events (id, title, is_published, booth_price, booth_quota, booth_sold_count) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, \
             is_published = EXCLUDED.is_published, booth_price = EXCLUDED.booth_price, \
             booth_quota = EXCLUDED.booth_quota, updated_at = NOW()",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.is_published)
        .bind(event.booth_price)
        .bind(event.booth_quota)
        .bind(event.booth_sold_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_voucher(&self, code: &str) -> Result<Option<Voucher>, ApiError> {
        let row = sqlx::query_as::<_, VoucherRow>(
            "SELECT id, code, type, value, max_discount, is_active, max_uses, used_count, \
             valid_from, valid_to, event_id FROM vouchers WHERE code = $1",
        )
        .bind(normalize_code(code))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Voucher::try_from).transpose()?)
    }

    async fn insert_voucher(&self, voucher: &Voucher) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO vouchers (id, code, type, value, max_discount, is_active, max_uses, \
             used_count, valid_from, valid_to, event_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET code = EXCLUDED.code, type = EXCLUDED.type, \
             value = EXCLUDED.value, max_discount = EXCLUDED.max_discount, \
             is_active = EXCLUDED.is_active, max_uses = EXCLUDED.max_uses, \
             valid_from = EXCLUDED.valid_from, valid_to = EXCLUDED.valid_to, \
             event_id = EXCLUDED.event_id, updated_at = NOW()",
        )
        .bind(voucher.id)
        .bind(normalize_code(&voucher.code))
        .bind(voucher.voucher_type.as_str())
        .bind(voucher.value)
        .bind(voucher.max_discount)
        .bind(voucher.is_active)
        .bind(voucher.max_uses)
        .bind(voucher.used_count)
        .bind(voucher.valid_from)
        .bind(voucher.valid_to)
        .bind(voucher.event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO bookings (id, order_id, event_id, base_price, discount, amount, \
             voucher_code, status, contact_name, contact_email, contact_phone, company, notes, \
             paid_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(booking.id)
        .bind(booking.order_id.as_str())
        .bind(booking.event_id)
        .bind(booking.base_price)
        .bind(booking.discount)
        .bind(booking.amount)
        .bind(booking.voucher_code.as_deref())
        .bind(booking.status.as_str())
        .bind(&booking.contact.name)
        .bind(&booking.contact.email)
        .bind(&booking.contact.phone)
        .bind(booking.contact.company.as_deref())
        .bind(booking.contact.notes.as_deref())
        .bind(booking.paid_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_booking(&self, order_id: &OrderId) -> Result<Option<Booking>, ApiError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, order_id, event_id, base_price, discount, amount, voucher_code, status, \
             contact_name, contact_email, contact_phone, company, notes, paid_at, created_at, \
             updated_at FROM bookings WHERE order_id = $1",
        )
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Booking::try_from).transpose()?)
    }

    async fn upsert_payment(&self, record: &PaymentRecord) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO payments (id, order_id, status, channel, gross_amount, raw, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (order_id) DO UPDATE SET status = EXCLUDED.status, \
             channel = EXCLUDED.channel, gross_amount = EXCLUDED.gross_amount, \
             raw = EXCLUDED.raw, updated_at = EXCLUDED.updated_at",
        )
        .bind(record.id)
        .bind(record.order_id.as_str())
        .bind(&record.status)
        .bind(record.channel.as_deref())
        .bind(record.gross_amount)
        .bind(&record.raw)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_payment(&self, order_id: &OrderId) -> Result<Option<PaymentRecord>, ApiError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, order_id, status, channel, gross_amount, raw, created_at, updated_at \
             FROM payments WHERE order_id = $1",
        )
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PaymentRecord::from))
    }

    async fn settle_payment(
        &self,
        order_id: &OrderId,
        command: SettlementCommand,
    ) -> Result<SettlementOutcome, ApiError> {
        let mut attempt = 0_u32;
        loop {
            let result = match command {
                SettlementCommand::Pay { amount_matches } => {
                    self.try_pay(order_id, amount_matches).await
                }
                SettlementCommand::FraudReview => {
                    let outcome = SettlementOutcome::Review {
                        reason: ReviewReason::FraudChallenge,
                    };
                    self.guarded_transition(order_id, MARK_FRAUD_REVIEW, outcome)
                        .await
                }
                SettlementCommand::Fail => {
                    self.guarded_transition(order_id, MARK_FAILED, SettlementOutcome::Failed)
                        .await
                }
            };
            match result {
                Ok(outcome) => return Ok(outcome),
                Err(AttemptError::NotFound) => {
                    return Err(ApiError::BookingNotFound(order_id.to_string()));
                }
                Err(AttemptError::MissingEvent(event_id)) => {
                    return Err(ApiError::Internal(format!(
                        "event {event_id} missing for booking {order_id}"
                    )));
                }
                Err(AttemptError::Db(err)) if is_retryable(&err) && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(%order_id, attempt, "settlement serialization conflict, retrying");
                }
                Err(AttemptError::Db(err)) => return Err(err.into()),
            }
        }
    }
}
