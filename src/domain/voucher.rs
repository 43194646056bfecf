//! Voucher rules: eligibility checks and discount computation.
//!
//! Both [`Voucher::validate`] and [`compute_discount`] are pure. Usage
//! counters are only ever touched by the settlement transaction in
//! [`crate::store`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// How a voucher's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherType {
    /// `value` is an absolute amount in minor currency units.
    Fixed,
    /// `value` is a percentage of the base price (0–100).
    Percent,
}

impl VoucherType {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "FIXED",
            Self::Percent => "PERCENT",
        }
    }

    /// Parses the persisted string form, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIXED" => Some(Self::Fixed),
            "PERCENT" => Some(Self::Percent),
            _ => None,
        }
    }
}

/// Why a voucher cannot be applied to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherRejection {
    /// No voucher with this code exists.
    InvalidCode,
    /// The voucher has been switched off.
    Inactive,
    /// `valid_from` lies in the future.
    NotYetValid,
    /// `valid_to` lies in the past.
    Expired,
    /// `used_count` has reached `max_uses`.
    UsageLimitReached,
    /// The voucher is scoped to a different event.
    EventMismatch,
}

impl VoucherRejection {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "INVALID_CODE",
            Self::Inactive => "INACTIVE",
            Self::NotYetValid => "NOT_YET_VALID",
            Self::Expired => "EXPIRED",
            Self::UsageLimitReached => "USAGE_LIMIT_REACHED",
            Self::EventMismatch => "EVENT_MISMATCH",
        }
    }

    /// Human-readable explanation.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidCode => "voucher code not found",
            Self::Inactive => "voucher is not active",
            Self::NotYetValid => "voucher is not valid yet",
            Self::Expired => "voucher has expired",
            Self::UsageLimitReached => "voucher usage limit reached",
            Self::EventMismatch => "voucher does not apply to this event",
        }
    }
}

/// A discount code as stored in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Row identifier.
    pub id: Uuid,
    /// Unique code, stored upper-cased.
    pub code: String,
    /// Discount kind.
    #[serde(rename = "type")]
    pub voucher_type: VoucherType,
    /// Fixed amount or percentage, depending on `voucher_type`.
    pub value: i64,
    /// Upper bound on a percentage discount.
    #[serde(default)]
    pub max_discount: Option<i64>,
    /// Master switch.
    pub is_active: bool,
    /// Total redemptions allowed; `None` = unlimited.
    #[serde(default)]
    pub max_uses: Option<i64>,
    /// Redemptions consumed by paid bookings.
    #[serde(default)]
    pub used_count: i64,
    /// Start of the validity window.
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window.
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    /// Restricts the voucher to a single event when set.
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

impl Voucher {
    /// Checks whether this voucher may be applied to a booking for
    /// `event_id` at time `now`.
    ///
    /// # Errors
    ///
    /// Returns the first [`VoucherRejection`] that applies, checked in the
    /// order: active, window start, window end, usage cap, event scope.
    pub fn validate(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<(), VoucherRejection> {
        if !self.is_active {
            return Err(VoucherRejection::Inactive);
        }
        if let Some(from) = self.valid_from
            && now < from
        {
            return Err(VoucherRejection::NotYetValid);
        }
        if let Some(to) = self.valid_to
            && now > to
        {
            return Err(VoucherRejection::Expired);
        }
        if let Some(max) = self.max_uses
            && self.used_count >= max
        {
            return Err(VoucherRejection::UsageLimitReached);
        }
        if let Some(scope) = self.event_id
            && scope != event_id
        {
            return Err(VoucherRejection::EventMismatch);
        }
        Ok(())
    }

    /// Returns `true` while another redemption fits under `max_uses`.
    #[must_use]
    pub fn can_consume(&self) -> bool {
        self.is_active && self.max_uses.is_none_or(|max| self.used_count < max)
    }
}

/// Validates the result of a voucher lookup by code.
///
/// # Errors
///
/// Returns [`VoucherRejection::InvalidCode`] when `voucher` is `None`,
/// otherwise whatever [`Voucher::validate`] reports.
pub fn validate(
    voucher: Option<&Voucher>,
    event_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), VoucherRejection> {
    let voucher = voucher.ok_or(VoucherRejection::InvalidCode)?;
    voucher.validate(event_id, now)
}

/// Normalizes a user-supplied voucher code for lookup.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Computes the discount a voucher grants on `base_price`.
///
/// The result is always within `[0, base_price]` and percentage discounts
/// are floored, so rounding never favours the seller.
#[must_use]
pub fn compute_discount(base_price: i64, voucher: &Voucher) -> i64 {
    let base = base_price.max(0);
    let discount = match voucher.voucher_type {
        VoucherType::Fixed => voucher.value.clamp(0, base),
        VoucherType::Percent => {
            let pct = i128::from(voucher.value.clamp(0, 100));
            // base <= i64::MAX and pct <= 100, so the quotient fits in i64.
            let raw = i64::try_from(i128::from(base) * pct / 100).unwrap_or(base);
            match voucher.max_discount {
                Some(cap) => raw.min(cap.max(0)),
                None => raw,
            }
        }
    };
    discount.clamp(0, base)
}

/// Returns the payable amount after applying `discount`, floored at zero.
#[must_use]
pub fn payable_amount(base_price: i64, discount: i64) -> i64 {
    base_price.saturating_sub(discount).max(0)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn voucher(voucher_type: VoucherType, value: i64, max_discount: Option<i64>) -> Voucher {
        Voucher {
            id: Uuid::new_v4(),
            code: "TEST".to_string(),
            voucher_type,
            value,
            max_discount,
            is_active: true,
            max_uses: None,
            used_count: 0,
            valid_from: None,
            valid_to: None,
            event_id: None,
        }
    }

    #[test]
    fn fixed_discount_subtracts_value() {
        let v = voucher(VoucherType::Fixed, 25_000, None);
        assert_eq!(compute_discount(100_000, &v), 25_000);
        assert_eq!(payable_amount(100_000, compute_discount(100_000, &v)), 75_000);
    }

    #[test]
    fn fixed_discount_larger_than_price_clamps_to_zero_amount() {
        let v = voucher(VoucherType::Fixed, 150_000, None);
        let discount = compute_discount(100_000, &v);
        assert_eq!(discount, 100_000);
        assert_eq!(payable_amount(100_000, discount), 0);
    }

    #[test]
    fn negative_fixed_value_grants_nothing() {
        let v = voucher(VoucherType::Fixed, -500, None);
        assert_eq!(compute_discount(100_000, &v), 0);
    }

    #[test]
    fn percent_discount_floors() {
        let v = voucher(VoucherType::Percent, 33, None);
        // 99_999 * 33 / 100 = 32_999.67
        assert_eq!(compute_discount(99_999, &v), 32_999);
    }

    #[test]
    fn percent_discount_respects_cap() {
        let v = voucher(VoucherType::Percent, 50, Some(40_000));
        assert_eq!(compute_discount(100_000, &v), 40_000);
        assert_eq!(payable_amount(100_000, 40_000), 60_000);
    }

    #[test]
    fn percent_cap_above_raw_is_ignored() {
        let v = voucher(VoucherType::Percent, 10, Some(40_000));
        assert_eq!(compute_discount(100_000, &v), 10_000);
    }

    #[test]
    fn percent_value_clamped_to_hundred() {
        let v = voucher(VoucherType::Percent, 250, None);
        assert_eq!(compute_discount(80_000, &v), 80_000);
    }

    #[test]
    fn negative_cap_means_no_discount() {
        let v = voucher(VoucherType::Percent, 50, Some(-1));
        assert_eq!(compute_discount(80_000, &v), 0);
    }

    #[test]
    fn percent_on_huge_price_does_not_overflow() {
        let v = voucher(VoucherType::Percent, 100, None);
        assert_eq!(compute_discount(i64::MAX, &v), i64::MAX);
    }

    #[test]
    fn missing_voucher_is_invalid_code() {
        assert_eq!(
            validate(None, Uuid::new_v4(), Utc::now()),
            Err(VoucherRejection::InvalidCode)
        );
    }

    #[test]
    fn inactive_voucher_rejected() {
        let mut v = voucher(VoucherType::Fixed, 1, None);
        v.is_active = false;
        assert_eq!(
            v.validate(Uuid::new_v4(), Utc::now()),
            Err(VoucherRejection::Inactive)
        );
    }

    #[test]
    fn window_bounds_checked() {
        let now = Utc::now();
        let mut v = voucher(VoucherType::Fixed, 1, None);
        v.valid_from = Some(now + Duration::hours(1));
        assert_eq!(
            v.validate(Uuid::new_v4(), now),
            Err(VoucherRejection::NotYetValid)
        );

        v.valid_from = Some(now - Duration::days(2));
        v.valid_to = Some(now - Duration::days(1));
        assert_eq!(
            v.validate(Uuid::new_v4(), now),
            Err(VoucherRejection::Expired)
        );

        v.valid_to = Some(now + Duration::days(1));
        assert!(v.validate(Uuid::new_v4(), now).is_ok());
    }

    #[test]
    fn usage_cap_checked() {
        let mut v = voucher(VoucherType::Fixed, 1, None);
        v.max_uses = Some(3);
        v.used_count = 3;
        assert_eq!(
            v.validate(Uuid::new_v4(), Utc::now()),
            Err(VoucherRejection::UsageLimitReached)
        );
        assert!(!v.can_consume());

        v.used_count = 2;
        assert!(v.validate(Uuid::new_v4(), Utc::now()).is_ok());
        assert!(v.can_consume());
    }

    #[test]
    fn event_scope_checked() {
        let event = Uuid::new_v4();
        let mut v = voucher(VoucherType::Fixed, 1, None);
        v.event_id = Some(event);
        assert!(v.validate(event, Utc::now()).is_ok());
        assert_eq!(
            v.validate(Uuid::new_v4(), Utc::now()),
            Err(VoucherRejection::EventMismatch)
        );
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  half "), "HALF");
    }

    #[test]
    fn voucher_type_parses_any_case() {
        assert_eq!(VoucherType::parse("percent"), Some(VoucherType::Percent));
        assert_eq!(VoucherType::parse("FIXED"), Some(VoucherType::Fixed));
        assert_eq!(VoucherType::parse("bogus"), None);
    }

    #[test]
    fn rejection_serializes_as_code() {
        let json = serde_json::to_string(&VoucherRejection::UsageLimitReached).unwrap_or_default();
        assert_eq!(json, "\"USAGE_LIMIT_REACHED\"");
    }
}
