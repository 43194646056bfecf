//! Per-connection subscription manager.
//!
//! Tracks which orders a WebSocket client follows and filters
//! [`crate::domain::BookingUpdate`]s server-side.

use std::collections::HashSet;

use crate::domain::OrderId;

/// Wildcard entry that follows every booking.
pub const WILDCARD: &str = "*";

/// Manages the set of order subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed orders. Ignored while `subscribe_all` is set.
    order_ids: HashSet<OrderId>,
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds raw order ids from a client command; [`WILDCARD`] enables
    /// the catch-all. Returns the explicit ids added.
    pub fn subscribe(&mut self, raw_ids: &[String]) -> Vec<OrderId> {
        let mut added = Vec::new();
        for raw in raw_ids {
            let raw = raw.trim();
            if raw == WILDCARD {
                self.subscribe_all = true;
            } else if !raw.is_empty() {
                let id = OrderId::from_string(raw);
                self.order_ids.insert(id.clone());
                added.push(id);
            }
        }
        added
    }

    /// Removes order ids. [`WILDCARD`] turns the catch-all off.
    pub fn unsubscribe(&mut self, raw_ids: &[String]) -> Vec<OrderId> {
        let mut removed = Vec::new();
        for raw in raw_ids {
            let raw = raw.trim();
            if raw == WILDCARD {
                self.subscribe_all = false;
                continue;
            }
            let id = OrderId::from_string(raw);
            if self.order_ids.remove(&id) {
                removed.push(id);
            }
        }
        removed
    }

    /// Returns `true` if updates for `order_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, order_id: &OrderId) -> bool {
        self.subscribe_all || self.order_ids.contains(order_id)
    }

    /// Returns the number of explicitly followed orders.
    #[must_use]
    pub fn count(&self) -> usize {
        self.order_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&OrderId::generate()));
    }

    #[test]
    fn follows_specific_order() {
        let mut mgr = SubscriptionManager::new();
        let added = mgr.subscribe(&ids(&["BOOTH-1-A", " "]));
        assert_eq!(added, vec![OrderId::from_string("BOOTH-1-A")]);
        assert!(mgr.matches(&OrderId::from_string("BOOTH-1-A")));
        assert!(!mgr.matches(&OrderId::from_string("BOOTH-1-B")));
    }

    #[test]
    fn wildcard_matches_everything_until_dropped() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&ids(&["*"]));
        assert!(mgr.matches(&OrderId::generate()));
        let _ = mgr.unsubscribe(&ids(&["*"]));
        assert!(!mgr.matches(&OrderId::generate()));
    }

    #[test]
    fn unsubscribe_reports_only_removed() {
        let mut mgr = SubscriptionManager::new();
        let _ = mgr.subscribe(&ids(&["BOOTH-1-A", "BOOTH-1-B"]));
        assert_eq!(mgr.count(), 2);
        let removed = mgr.unsubscribe(&ids(&["BOOTH-1-A", "BOOTH-9-Z"]));
        assert_eq!(removed.len(), 1);
        assert_eq!(mgr.count(), 1);
    }
}
