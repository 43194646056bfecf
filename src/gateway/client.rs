//! Outbound client for the Snap transaction API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::PaymentConfig;
use crate::domain::{ContactDetails, OrderId};
use crate::error::ApiError;

/// Everything the gateway needs to open a payable transaction.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// Idempotency and correlation key.
    pub order_id: OrderId,
    /// Amount to charge, minor currency units.
    pub gross_amount: i64,
    /// Payer details.
    pub customer: ContactDetails,
    /// Line item label shown on the payment page.
    pub item_name: String,
}

/// Token and hosted page the client uses to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentSession {
    /// Snap token for the embedded payment popup.
    pub token: String,
    /// Hosted payment page.
    pub redirect_url: String,
}

/// Outbound payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    /// Opens a payable transaction for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PaymentGateway`] when the provider is
    /// unreachable or rejects the request.
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<PaymentSession, ApiError>;
}

/// Snap API client authenticating with the server key over HTTP Basic.
#[derive(Debug, Clone)]
pub struct SnapClient {
    http: reqwest::Client,
    config: PaymentConfig,
}

#[derive(Debug, Deserialize)]
struct SnapErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
}

impl SnapClient {
    /// Builds a client from explicit payment settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the HTTP client cannot be built.
    pub fn new(config: PaymentConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Internal(format!("building http client: {e}")))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/snap/v1/transactions",
            self.config.api_base_url.trim_end_matches('/')
        )
    }
}

/// Builds the Snap `create transaction` payload.
#[must_use]
pub fn transaction_body(
    request: &TransactionRequest,
    finish_redirect_url: Option<&str>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "transaction_details": {
            "order_id": request.order_id.as_str(),
            "gross_amount": request.gross_amount,
        },
        "customer_details": {
            "first_name": request.customer.name,
            "email": request.customer.email,
            "phone": request.customer.phone,
        },
        "item_details": [{
            "id": "BOOTH",
            "price": request.gross_amount,
            "quantity": 1,
            "name": truncate_chars(&request.item_name, 50),
        }],
    });
    if let (Some(url), Some(obj)) = (finish_redirect_url, body.as_object_mut()) {
        obj.insert(
            "callbacks".to_string(),
            serde_json::json!({ "finish": url }),
        );
    }
    body
}

/// The gateway caps item names at 50 characters.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[async_trait]
impl PaymentGateway for SnapClient {
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<PaymentSession, ApiError> {
        let body = transaction_body(request, self.config.finish_redirect_url.as_deref());
        let response = self
            .http
            .post(self.endpoint())
            .basic_auth(&self.config.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::PaymentGateway(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<SnapErrorBody>()
                .await
                .map(|b| b.error_messages.join("; "))
                .unwrap_or_default();
            tracing::warn!(order_id = %request.order_id, %status, %detail, "gateway rejected transaction");
            return Err(ApiError::PaymentGateway(format!(
                "gateway returned {status}: {detail}"
            )));
        }

        let session = response
            .json::<PaymentSession>()
            .await
            .map_err(|e| ApiError::PaymentGateway(format!("malformed gateway response: {e}")))?;
        tracing::info!(order_id = %request.order_id, "payment transaction created");
        Ok(session)
    }
}
