//! WebSocket push of booking updates over a real listener.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use common::{booking_body, harness, notification, send, Harness};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(h: &Harness) -> String {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let app = h.app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("ws://{addr}/ws")
}

async fn connect(url: &str) -> Ws {
    let Ok((ws, _)) = tokio_tungstenite::connect_async(url).await else {
        panic!("ws connect failed");
    };
    ws
}

async fn next_json(ws: &mut Ws) -> serde_json::Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await
        else {
            panic!("no ws message within timeout");
        };
        if let Message::Text(text) = msg {
            let Ok(json) = serde_json::from_str(text.as_str()) else {
                panic!("non-JSON frame: {}", text.as_str());
            };
            return json;
        }
    }
}

async fn command(ws: &mut Ws, id: &str, payload: serde_json::Value) -> serde_json::Value {
    let frame = serde_json::json!({"id": id, "type": "command", "payload": payload});
    let Ok(()) = ws.send(Message::text(frame.to_string())).await else {
        panic!("ws send failed");
    };
    next_json(ws).await
}

#[tokio::test]
async fn subscriber_sees_settlement_of_followed_order() {
    let h = harness(Some(1), 0).await;
    let url = serve(&h).await;

    let (_, created) = send(
        &h.app,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(h.event_id, Some("HALF"))),
    )
    .await;
    let Some(order_id) = created["order_id"].as_str().map(str::to_string) else {
        panic!("no order id");
    };

    let mut ws = connect(&url).await;
    let reply = command(
        &mut ws,
        "sub-1",
        serde_json::json!({"command": "subscribe", "order_ids": [order_id]}),
    )
    .await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["id"], "sub-1");
    assert_eq!(reply["payload"]["count"], 1);

    let _ = send(
        &h.app,
        "POST",
        "/api/v1/payments/notification",
        Some(notification(&order_id, "settlement", "60000.00")),
    )
    .await;

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "booking_status_changed");
    assert_eq!(event["payload"]["order_id"], order_id.as_str());
    assert_eq!(event["payload"]["status"], "PAID");
}

#[tokio::test]
async fn wildcard_subscriber_sees_new_bookings() {
    let h = harness(None, 0).await;
    let url = serve(&h).await;

    let mut ws = connect(&url).await;
    let reply = command(
        &mut ws,
        "sub-all",
        serde_json::json!({"command": "subscribe", "order_ids": ["*"]}),
    )
    .await;
    assert_eq!(reply["payload"]["wildcard"], true);

    let (_, created) = send(
        &h.app,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(h.event_id, None)),
    )
    .await;

    let event = next_json(&mut ws).await;
    assert_eq!(event["payload"]["event_type"], "booking_created");
    assert_eq!(event["payload"]["order_id"], created["order_id"]);
    assert_eq!(event["payload"]["amount"], 100_000);
}

#[tokio::test]
async fn get_booking_and_unknown_commands() {
    let h = harness(None, 0).await;
    let url = serve(&h).await;
    let (_, created) = send(
        &h.app,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(h.event_id, None)),
    )
    .await;

    let mut ws = connect(&url).await;
    let reply = command(
        &mut ws,
        "get-1",
        serde_json::json!({"command": "get_booking", "order_id": created["order_id"]}),
    )
    .await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["status"], "PENDING");

    let reply = command(
        &mut ws,
        "get-2",
        serde_json::json!({"command": "get_booking", "order_id": "BOOTH-0-NONE"}),
    )
    .await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 404);

    let reply = command(&mut ws, "bad", serde_json::json!({"command": "swap"})).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(h.update_bus.receiver_count(), 1);
}
