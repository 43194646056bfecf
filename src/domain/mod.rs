//! Domain layer: bookings, events, vouchers, payments, and the update bus.
//!
//! Everything here is free of I/O. The rules that decide prices and
//! transitions live next to the types they govern; persistence and the
//! transaction boundary belong to [`crate::store`].

pub mod booking;
pub mod booking_update;
pub mod event;
pub mod order_id;
pub mod payment;
pub mod settlement;
pub mod update_bus;
pub mod voucher;

pub use booking::{Booking, BookingStatus, ContactDetails};
pub use booking_update::BookingUpdate;
pub use event::Event;
pub use order_id::OrderId;
pub use payment::{GatewayTransition, PaymentNotification, PaymentRecord};
pub use settlement::{ReviewReason, SettlementCommand, SettlementOutcome};
pub use update_bus::UpdateBus;
pub use voucher::{Voucher, VoucherRejection, VoucherType};
