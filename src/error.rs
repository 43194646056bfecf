//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type for the service. Each variant
//! maps to an HTTP status code and a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::VoucherRejection;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": "USAGE_LIMIT_REACHED",
///     "message": "voucher usage limit reached",
///     "field": "voucher_code"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with machine-readable code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Request field the error refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Service error enum with HTTP status code mapping.
///
/// | Category       | HTTP Status |
/// |----------------|-------------|
/// | Validation     | 400         |
/// | Authentication | 401         |
/// | Not found      | 404         |
/// | Capacity       | 409         |
/// | Storage        | 500         |
/// | Upstream       | 502         |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request validation failed.
    #[error("{message}")]
    InvalidRequest {
        /// What is wrong.
        message: String,
        /// Offending request field.
        field: Option<String>,
    },

    /// Event with the given ID does not exist.
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    /// Event exists but is not open for booking.
    #[error("event is not published: {0}")]
    EventUnpublished(Uuid),

    /// Every booth of the event has been sold.
    #[error("event is sold out")]
    SoldOut,

    /// The supplied voucher cannot be applied.
    #[error("{}", .0.message())]
    Voucher(VoucherRejection),

    /// No booking carries the given order id.
    #[error("booking not found: {0}")]
    BookingNotFound(String),

    /// Webhook signature did not verify.
    #[error("invalid notification signature")]
    InvalidSignature,

    /// The payment gateway call failed.
    #[error("payment gateway error: {0}")]
    PaymentGateway(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a validation error tied to a request field.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    /// Returns the machine-readable error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "VALIDATION_ERROR",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::EventUnpublished(_) => "EVENT_UNPUBLISHED",
            Self::SoldOut => "SOLD_OUT",
            Self::Voucher(rejection) => rejection.code(),
            Self::BookingNotFound(_) => "NOT_FOUND",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::PaymentGateway(_) => "PAYMENT_GATEWAY_ERROR",
            Self::Persistence(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } | Self::EventUnpublished(_) | Self::Voucher(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::EventNotFound(_) | Self::BookingNotFound(_) => StatusCode::NOT_FOUND,
            Self::SoldOut => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the request field this error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { field, .. } => field.as_deref(),
            Self::Voucher(_) => Some("voucher_code"),
            Self::EventNotFound(_) | Self::EventUnpublished(_) => Some("event_id"),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code().to_string(),
                message: self.to_string(),
                field: self.field().map(str::to_string),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_rejection_maps_to_field_error() {
        let err = ApiError::Voucher(VoucherRejection::Expired);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "EXPIRED");
        assert_eq!(err.field(), Some("voucher_code"));
        assert_eq!(err.to_string(), "voucher has expired");
    }

    #[test]
    fn sold_out_is_conflict() {
        assert_eq!(ApiError::SoldOut.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn bad_signature_is_unauthorized() {
        assert_eq!(
            ApiError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn missing_event_is_not_found() {
        let err = ApiError::EventNotFound(Uuid::nil());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.field(), Some("event_id"));
    }

    #[test]
    fn response_carries_status() {
        let response = ApiError::Persistence("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
