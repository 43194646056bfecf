//! Voucher preview DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::VoucherRejection;
use crate::service::VoucherQuote;

/// Request body for `POST /api/v1/vouchers/check`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoucherCheckRequest {
    /// Voucher code, any case.
    pub code: String,
    /// Event the booking would be for.
    pub event_id: Uuid,
}

/// Response body for `POST /api/v1/vouchers/check`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherCheckResponse {
    /// Whether the voucher would be accepted.
    pub valid: bool,
    /// Rejection code when `valid` is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<VoucherRejection>,
    /// Human-readable rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Booth price before discount.
    pub base_price: i64,
    /// Discount the voucher would grant.
    pub discount: i64,
    /// Amount that would be payable.
    pub amount: i64,
}

impl From<VoucherQuote> for VoucherCheckResponse {
    fn from(quote: VoucherQuote) -> Self {
        Self {
            valid: quote.rejection.is_none(),
            reason: quote.rejection,
            message: quote.rejection.map(|r| r.message().to_string()),
            base_price: quote.base_price,
            discount: quote.discount,
            amount: quote.amount,
        }
    }
}
