//! # booth-gateway
//!
//! Booth booking and payment reconciliation service.
//!
//! Exhibitors book a booth at an event, optionally with a discount
//! voucher, and pay through an external gateway. The gateway reports the
//! outcome asynchronously and possibly more than once; this service
//! settles each booking exactly once without ever selling more booths
//! than an event's quota.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)        Payment gateway
//!     │                                │  ▲
//!     ├── REST Handlers (api/)  ◄──────┘  │ Snap API (gateway/)
//!     ├── WS Handler (ws/)                │
//!     │                                   │
//!     ├── BookingService ─────────────────┘
//!     ├── WebhookReconciler (service/)
//!     ├── UpdateBus (domain/)
//!     │
//!     └── BookingStore (store/): PostgreSQL or in-memory
//! ```
//!
//! Quota is checked when a booking is created but only consumed when its
//! payment settles, inside a serializable store transaction.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod service;
pub mod store;
pub mod ws;
