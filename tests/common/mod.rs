//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt;
use uuid::Uuid;

use booth_gateway::api;
use booth_gateway::app_state::AppState;
use booth_gateway::config::PaymentConfig;
use booth_gateway::domain::{Event, UpdateBus, Voucher, VoucherType};
use booth_gateway::error::ApiError;
use booth_gateway::gateway::signature::notification_signature;
use booth_gateway::gateway::{PaymentGateway, PaymentSession, TransactionRequest};
use booth_gateway::store::{BookingStore, MemoryStore, SharedStore};

/// Server key shared by the app under test and the notification signer.
pub const SERVER_KEY: &str = "SB-Mid-server-INTEGRATION";

/// Gateway that hands out a deterministic session.
#[derive(Debug, Default)]
pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<PaymentSession, ApiError> {
        Ok(PaymentSession {
            token: format!("tok-{}", request.order_id),
            redirect_url: format!("https://pay.example/v2/{}", request.order_id),
        })
    }
}

/// App plus direct handles on its store.
#[derive(Debug)]
pub struct Harness {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub update_bus: UpdateBus,
    pub event_id: Uuid,
    pub other_event_id: Uuid,
}

fn voucher(code: &str, voucher_type: VoucherType, value: i64) -> Voucher {
    Voucher {
        id: Uuid::new_v4(),
        code: code.to_string(),
        voucher_type,
        value,
        max_discount: None,
        is_active: true,
        max_uses: None,
        used_count: 0,
        valid_from: None,
        valid_to: None,
        event_id: None,
    }
}

/// Event priced 100000 with the given quota and sold count, plus vouchers:
///
/// - `HALF`: 50% capped at 40000
/// - `OLD`: expired yesterday
/// - `ELSEWHERE`: scoped to another event
/// - `USEDUP`: max_uses reached
pub async fn harness(quota: Option<i64>, sold: i64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let event = Event {
        id: Uuid::new_v4(),
        title: "Global Education Expo".to_string(),
        is_published: true,
        booth_price: 100_000,
        booth_quota: quota,
        booth_sold_count: sold,
    };
    let other = Event {
        id: Uuid::new_v4(),
        title: "Other Expo".to_string(),
        ..event.clone()
    };
    let _ = store.insert_event(&event).await;
    let _ = store.insert_event(&other).await;

    let mut half = voucher("HALF", VoucherType::Percent, 50);
    half.max_discount = Some(40_000);
    let mut old = voucher("OLD", VoucherType::Fixed, 10_000);
    old.valid_to = Some(Utc::now() - Duration::days(1));
    let mut elsewhere = voucher("ELSEWHERE", VoucherType::Fixed, 10_000);
    elsewhere.event_id = Some(other.id);
    let mut used_up = voucher("USEDUP", VoucherType::Fixed, 10_000);
    used_up.max_uses = Some(2);
    used_up.used_count = 2;
    for v in [half, old, elsewhere, used_up] {
        let _ = store.insert_voucher(&v).await;
    }

    let update_bus = UpdateBus::new(64);
    let state = AppState::new(
        Arc::clone(&store) as SharedStore,
        Arc::new(StubGateway),
        &PaymentConfig::sandbox(SERVER_KEY),
        update_bus.clone(),
    );
    Harness {
        app: api::build_app(state),
        store,
        update_bus,
        event_id: event.id,
        other_event_id: other.id,
    }
}

/// Booking request body with valid contact fields.
pub fn booking_body(event_id: Uuid, voucher_code: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "event_id": event_id,
        "name": "Andi Wijaya",
        "email": "andi@consult.example",
        "phone": "+62 811 222 333",
        "company": "Andi Consulting",
        "voucher_code": voucher_code,
    })
}

/// Gateway notification body signed with [`SERVER_KEY`].
pub fn notification(
    order_id: &str,
    transaction_status: &str,
    gross_amount: &str,
) -> serde_json::Value {
    serde_json::json!({
        "order_id": order_id,
        "status_code": "200",
        "gross_amount": gross_amount,
        "signature_key": notification_signature(order_id, "200", gross_amount, SERVER_KEY),
        "transaction_status": transaction_status,
        "fraud_status": "accept",
        "payment_type": "bank_transfer",
        "transaction_id": Uuid::new_v4().to_string(),
    })
}

/// Sends one request through the router and decodes the JSON response.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let Ok(request) = builder.body(body) else {
        panic!("bad request");
    };
    let Ok(response) = app.clone().oneshot(request).await;
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
