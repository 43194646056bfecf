//! Service layer: business logic orchestration.
//!
//! [`BookingService`] prices and creates bookings and opens payment
//! sessions. [`WebhookReconciler`] authenticates gateway notifications and
//! hands the settlement step to the store. Both publish to the
//! [`super::domain::UpdateBus`].

pub mod booking_service;
pub mod reconciler;

pub use booking_service::{BookingService, CreatedBooking, NewBooking, VoucherQuote};
pub use reconciler::WebhookReconciler;
