//! Webhook reconciler: turns authenticated gateway notifications into
//! booking transitions.

use chrono::Utc;

use crate::config::PaymentConfig;
use crate::domain::{
    BookingUpdate, GatewayTransition, PaymentNotification, PaymentRecord, SettlementCommand,
    SettlementOutcome, UpdateBus,
};
use crate::error::ApiError;
use crate::gateway::SignatureVerifier;
use crate::store::SharedStore;

/// Applies gateway notifications to bookings.
///
/// Every notification is treated as idempotent input: redelivery, reordering
/// and concurrent delivery are all absorbed by the guarded writes inside
/// [`crate::store::BookingStore::settle_payment`].
#[derive(Debug, Clone)]
pub struct WebhookReconciler {
    store: SharedStore,
    verifier: SignatureVerifier,
    update_bus: UpdateBus,
}

impl WebhookReconciler {
    /// Creates a reconciler verifying signatures with `payment.server_key`.
    #[must_use]
    pub fn new(store: SharedStore, payment: &PaymentConfig, update_bus: UpdateBus) -> Self {
        Self {
            store,
            verifier: SignatureVerifier::new(payment.server_key.clone()),
            update_bus,
        }
    }

    /// Authenticates and applies one notification.
    ///
    /// `raw` is the payload exactly as received and is stored on the
    /// payment audit row.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidSignature`] before any state is read or written.
    /// - [`ApiError::BookingNotFound`] when the order id is unknown.
    /// - [`ApiError::Persistence`] on storage failure; the gateway retries
    ///   and replaying the whole notification is safe.
    pub async fn reconcile(
        &self,
        notification: &PaymentNotification,
        raw: serde_json::Value,
    ) -> Result<SettlementOutcome, ApiError> {
        if !self.verifier.verify(notification) {
            tracing::warn!(
                order_id = %notification.order_id,
                status_code = %notification.status_code,
                "rejected notification with invalid signature"
            );
            return Err(ApiError::InvalidSignature);
        }

        let order_id = notification.order_id();
        let booking = self
            .store
            .find_booking(&order_id)
            .await?
            .ok_or_else(|| ApiError::BookingNotFound(order_id.to_string()))?;

        self.store
            .upsert_payment(&PaymentRecord::from_notification(notification, raw))
            .await?;

        let transition = notification.transition();
        let command = match transition {
            GatewayTransition::Paid => SettlementCommand::Pay {
                amount_matches: notification.gross_amount_minor() == Some(booking.amount),
            },
            GatewayTransition::FraudReview => SettlementCommand::FraudReview,
            GatewayTransition::Failed => SettlementCommand::Fail,
            GatewayTransition::Pending | GatewayTransition::Unknown => {
                if transition == GatewayTransition::Unknown {
                    tracing::warn!(
                        %order_id,
                        transaction_status = %notification.transaction_status,
                        "unrecognised gateway status, booking left as is"
                    );
                } else {
                    tracing::debug!(%order_id, "payment still pending");
                }
                return Ok(SettlementOutcome::NoTransition);
            }
        };

        let outcome = self.store.settle_payment(&order_id, command).await?;
        log_outcome(&order_id, notification, booking.amount, outcome);

        if let Some(status) = outcome.new_status() {
            let review_reason = match outcome {
                SettlementOutcome::Review { reason } => Some(reason),
                _ => None,
            };
            let _ = self.update_bus.publish(BookingUpdate::BookingStatusChanged {
                order_id,
                status,
                review_reason,
                timestamp: Utc::now(),
            });
        }
        Ok(outcome)
    }
}

fn log_outcome(
    order_id: &crate::domain::OrderId,
    notification: &PaymentNotification,
    booking_amount: i64,
    outcome: SettlementOutcome,
) {
    match outcome {
        SettlementOutcome::Review { reason } => tracing::warn!(
            %order_id,
            ?reason,
            booking_amount,
            gross_amount = %notification.gross_amount,
            "booking routed to review"
        ),
        SettlementOutcome::AlreadyPaid | SettlementOutcome::Ignored { .. } => tracing::debug!(
            %order_id,
            outcome = outcome.as_str(),
            "duplicate or stale notification"
        ),
        SettlementOutcome::Paid | SettlementOutcome::Failed | SettlementOutcome::NoTransition => {
            tracing::info!(
                %order_id,
                outcome = outcome.as_str(),
                transaction_status = %notification.transaction_status,
                "notification settled"
            );
        }
    }
}
