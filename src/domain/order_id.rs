//! Externally visible booking correlation key.
//!
//! [`OrderId`] is the key the payment gateway echoes back in every
//! notification, so it doubles as the gateway's idempotency key and must
//! never repeat.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Prefix shared by every generated order id.
const PREFIX: &str = "BOOTH";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 8;

/// Unique booking order identifier, e.g. `BOOTH-20261016093015123-K3M9Q2ZA`.
///
/// Generated as a millisecond UTC timestamp plus a random alphanumeric
/// suffix. Parsed values from the gateway are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a fresh order id.
    #[must_use]
    pub fn generate() -> Self {
        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        Self(format!("{PREFIX}-{stamp}-{suffix}"))
    }

    /// Wraps an order id received from outside.
    #[must_use]
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<OrderId> = (0..2_000).map(|_| OrderId::generate()).collect();
        assert_eq!(ids.len(), 2_000);
    }

    #[test]
    fn generated_id_shape() {
        let id = OrderId::generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        let [prefix, stamp, suffix] = parts.as_slice() else {
            panic!("unexpected order id shape: {id}");
        };
        assert_eq!(*prefix, "BOOTH");
        assert_eq!(stamp.len(), 17);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn display_matches_inner() {
        let id = OrderId::from_string("BOOTH-1-ABC");
        assert_eq!(format!("{id}"), "BOOTH-1-ABC");
    }

    #[test]
    fn serializes_transparently() {
        let id = OrderId::from_string("BOOTH-1-ABC");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"BOOTH-1-ABC\"");
    }
}
