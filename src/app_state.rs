//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::PaymentConfig;
use crate::domain::UpdateBus;
use crate::gateway::PaymentGateway;
use crate::service::{BookingService, WebhookReconciler};
use crate::store::SharedStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Booking creation, lookup and voucher preview.
    pub booking_service: Arc<BookingService>,
    /// Payment notification handling.
    pub reconciler: Arc<WebhookReconciler>,
    /// Update bus for WebSocket subscriptions.
    pub update_bus: UpdateBus,
}

impl AppState {
    /// Wires the services around one store, gateway and bus.
    #[must_use]
    pub fn new(
        store: SharedStore,
        gateway: Arc<dyn PaymentGateway>,
        payment: &PaymentConfig,
        update_bus: UpdateBus,
    ) -> Self {
        let booking_service = Arc::new(BookingService::new(
            Arc::clone(&store),
            gateway,
            update_bus.clone(),
        ));
        let reconciler = Arc::new(WebhookReconciler::new(store, payment, update_bus.clone()));
        Self {
            booking_service,
            reconciler,
            update_bus,
        }
    }
}
