//! Payment notification acknowledgement.

use serde::Serialize;
use utoipa::ToSchema;

/// Body returned to the gateway once a notification is accepted.
///
/// Carries no booking state; the gateway only needs the 200.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationAck {
    /// Always `"OK"`.
    pub message: String,
}

impl NotificationAck {
    /// The standard acknowledgement.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            message: "OK".to_string(),
        }
    }
}
