//! Inputs and outcomes of the settlement step.

use serde::Serialize;

use super::BookingStatus;

/// What the reconciler asks the store to apply to one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementCommand {
    /// Settle to `PAID`. `amount_matches` is `false` when the notified
    /// gross amount differs from the booking amount.
    Pay {
        /// Whether the notified amount equals the booking amount.
        amount_matches: bool,
    },
    /// Park in `REVIEW` because fraud screening challenged the capture.
    FraudReview,
    /// Move to `FAILED`.
    Fail,
}

/// Why a booking was routed to `REVIEW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    /// Notified gross amount differs from the booking amount.
    AmountMismatch,
    /// No booth left at settlement time.
    QuotaExhausted,
    /// Gateway fraud screening challenged the payment.
    FraudChallenge,
}

/// Result of applying a [`SettlementCommand`].
///
/// None of these are errors: duplicates and refused transitions are the
/// expected outcome of redelivered notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Booking moved to `PAID`; quota (and voucher usage) consumed.
    Paid,
    /// Booking was already `PAID`; nothing changed.
    AlreadyPaid,
    /// Booking is now in `REVIEW`.
    Review {
        /// Why.
        reason: ReviewReason,
    },
    /// Booking is now `FAILED`.
    Failed,
    /// The transition was refused for a booking in `current`.
    Ignored {
        /// State that blocked the transition.
        current: BookingStatus,
    },
    /// Notification did not ask for a booking transition.
    NoTransition,
}

impl SettlementOutcome {
    /// Status the booking holds after this outcome, if it changed.
    #[must_use]
    pub const fn new_status(&self) -> Option<BookingStatus> {
        match self {
            Self::Paid => Some(BookingStatus::Paid),
            Self::Review { .. } => Some(BookingStatus::Review),
            Self::Failed => Some(BookingStatus::Failed),
            Self::AlreadyPaid | Self::Ignored { .. } | Self::NoTransition => None,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::AlreadyPaid => "already_paid",
            Self::Review { .. } => "review",
            Self::Failed => "failed",
            Self::Ignored { .. } => "ignored",
            Self::NoTransition => "no_transition",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_real_transitions_report_status() {
        assert_eq!(SettlementOutcome::Paid.new_status(), Some(BookingStatus::Paid));
        assert_eq!(
            SettlementOutcome::Review {
                reason: ReviewReason::QuotaExhausted
            }
            .new_status(),
            Some(BookingStatus::Review)
        );
        assert_eq!(SettlementOutcome::AlreadyPaid.new_status(), None);
        assert_eq!(SettlementOutcome::NoTransition.new_status(), None);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_string(&SettlementOutcome::Review {
            reason: ReviewReason::AmountMismatch,
        })
        .unwrap_or_default();
        assert_eq!(json, r#"{"outcome":"review","reason":"amount_mismatch"}"#);
    }
}
