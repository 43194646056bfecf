//! Notification signature computation and verification.
//!
//! The gateway signs each notification as
//! `hex(SHA-512(order_id + status_code + gross_amount + server_key))`.

use sha2::{Digest, Sha512};

use crate::domain::PaymentNotification;

/// Computes the expected signature for the given notification fields.
#[must_use]
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies notification signatures against a shared server key.
#[derive(Clone)]
pub struct SignatureVerifier {
    server_key: String,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    /// Creates a verifier for `server_key`.
    #[must_use]
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: server_key.into(),
        }
    }

    /// Signs the given fields with this verifier's key.
    #[must_use]
    pub fn sign(&self, order_id: &str, status_code: &str, gross_amount: &str) -> String {
        notification_signature(order_id, status_code, gross_amount, &self.server_key)
    }

    /// Returns `true` when the notification's `signature_key` matches.
    ///
    /// Comparison is case-insensitive over the hex digits and runs in
    /// time independent of where the first differing byte is.
    #[must_use]
    pub fn verify(&self, notification: &PaymentNotification) -> bool {
        let expected = self.sign(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
        );
        let provided = notification.signature_key.trim().to_ascii_lowercase();
        constant_time_eq::constant_time_eq(expected.as_bytes(), provided.as_bytes())
    }
}
