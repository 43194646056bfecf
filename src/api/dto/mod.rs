//! Data Transfer Objects for REST request/response serialization.
//!
//! Monetary amounts are integers in the minor currency unit.

pub mod booking_dto;
pub mod voucher_dto;
pub mod webhook_dto;

pub use booking_dto::*;
pub use voucher_dto::*;
pub use webhook_dto::*;
