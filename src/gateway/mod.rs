//! Payment gateway integration: outbound transaction creation and inbound
//! notification signature verification.

pub mod client;
pub mod signature;

pub use client::{PaymentGateway, PaymentSession, SnapClient, TransactionRequest};
pub use signature::SignatureVerifier;
