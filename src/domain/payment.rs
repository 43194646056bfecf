//! Gateway notifications, the payment audit row, and the mapping from the
//! gateway's status vocabulary onto booking transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderId;

/// A payment notification as delivered by the gateway.
///
/// Field names follow the gateway's JSON. `gross_amount` is kept as the
/// raw string because the signature is computed over it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Booking correlation key.
    pub order_id: String,
    /// Gateway HTTP-ish status code, e.g. `"200"`.
    pub status_code: String,
    /// Amount charged, decimal string, e.g. `"60000.00"`.
    pub gross_amount: String,
    /// `hex(SHA-512(order_id + status_code + gross_amount + server_key))`.
    pub signature_key: String,
    /// Gateway transaction status, e.g. `"settlement"`.
    pub transaction_status: String,
    /// Fraud screening verdict for card captures.
    #[serde(default)]
    pub fraud_status: Option<String>,
    /// Payment channel, e.g. `"bank_transfer"`.
    #[serde(default)]
    pub payment_type: Option<String>,
    /// Gateway-side transaction id.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl PaymentNotification {
    /// Returns the order id as a domain key.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        OrderId::from_string(self.order_id.clone())
    }

    /// Maps the gateway status pair onto a booking transition.
    #[must_use]
    pub fn transition(&self) -> GatewayTransition {
        GatewayTransition::from_gateway(&self.transaction_status, self.fraud_status.as_deref())
    }

    /// Parses `gross_amount` into minor currency units.
    #[must_use]
    pub fn gross_amount_minor(&self) -> Option<i64> {
        parse_gross_amount(&self.gross_amount)
    }
}

/// What a gateway status asks the booking to become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayTransition {
    /// Funds captured: settle to `PAID`.
    Paid,
    /// Captured but held by fraud screening: move to `REVIEW`.
    FraudReview,
    /// Denied (fraud-denied captures included), cancelled, expired,
    /// refunded or charged back.
    Failed,
    /// Still awaiting payment; only the audit row changes.
    Pending,
    /// A status this service does not recognise; treated like `Pending`.
    Unknown,
}

impl GatewayTransition {
    /// Maps `transaction_status` (and `fraud_status` for captures).
    ///
    /// `cancel` and `expire` fold into [`GatewayTransition::Failed`].
    #[must_use]
    pub fn from_gateway(transaction_status: &str, fraud_status: Option<&str>) -> Self {
        let fraud = fraud_status.map(|s| s.trim().to_ascii_lowercase());
        match transaction_status.trim().to_ascii_lowercase().as_str() {
            "settlement" => Self::Paid,
            "capture" => match fraud.as_deref() {
                None | Some("" | "accept") => Self::Paid,
                Some("challenge") => Self::FraudReview,
                Some(_) => Self::Failed,
            },
            "pending" | "authorize" => Self::Pending,
            "deny" | "failure" | "refund" | "partial_refund" | "chargeback"
            | "partial_chargeback" | "cancel" | "expire" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Parses a gateway amount string such as `"60000"` or `"60000.00"`.
///
/// Only an all-zero fractional part is accepted; anything else returns
/// `None`, which settlement treats as an amount mismatch.
#[must_use]
pub fn parse_gross_amount(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac.bytes().all(|b| b == b'0') {
        return None;
    }
    whole.parse().ok()
}

/// Latest gateway view of an order, one row per `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Row identifier (stable across upserts).
    pub id: Uuid,
    /// Booking correlation key.
    pub order_id: OrderId,
    /// Gateway transaction status, upper-cased.
    pub status: String,
    /// Payment channel.
    pub channel: Option<String>,
    /// Parsed gross amount, when parseable.
    pub gross_amount: Option<i64>,
    /// Full notification payload.
    pub raw: serde_json::Value,
    /// First time this order was seen.
    pub created_at: DateTime<Utc>,
    /// Last notification time.
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Builds the audit row for a notification.
    #[must_use]
    pub fn from_notification(notification: &PaymentNotification, raw: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id: notification.order_id(),
            status: notification.transaction_status.trim().to_ascii_uppercase(),
            channel: notification.payment_type.clone(),
            gross_amount: notification.gross_amount_minor(),
            raw,
            created_at: now,
            updated_at: now,
        }
    }
}
