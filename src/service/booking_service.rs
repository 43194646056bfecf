//! Booking service: prices and persists new bookings, then opens the
//! payment transaction.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::voucher::{self, compute_discount, normalize_code, payable_amount};
use crate::domain::{Booking, BookingUpdate, ContactDetails, OrderId, UpdateBus, VoucherRejection};
use crate::error::ApiError;
use crate::gateway::{PaymentGateway, PaymentSession, TransactionRequest};
use crate::store::SharedStore;

/// Input for [`BookingService::create_booking`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Event to book a booth at.
    pub event_id: Uuid,
    /// Exhibitor contact.
    pub contact: ContactDetails,
    /// Optional voucher code, any case, surrounding blanks ignored.
    pub voucher_code: Option<String>,
}

/// A persisted booking plus the payment session opened for it.
#[derive(Debug, Clone)]
pub struct CreatedBooking {
    /// The `PENDING` booking.
    pub booking: Booking,
    /// `None` for zero-amount bookings, which need no payment.
    pub payment: Option<PaymentSession>,
}

/// Price preview for a voucher code against an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherQuote {
    /// Why the voucher cannot be used, if it cannot.
    pub rejection: Option<VoucherRejection>,
    /// Event booth price.
    pub base_price: i64,
    /// Discount the voucher would grant.
    pub discount: i64,
    /// Payable amount after the discount.
    pub amount: i64,
}

/// Orchestrates booking creation.
///
/// Quota is only checked here, never consumed: many `PENDING` bookings may
/// exist against a nearly full event and the store enforces capacity
/// when payments settle.
#[derive(Debug, Clone)]
pub struct BookingService {
    store: SharedStore,
    gateway: Arc<dyn PaymentGateway>,
    update_bus: UpdateBus,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(store: SharedStore, gateway: Arc<dyn PaymentGateway>, update_bus: UpdateBus) -> Self {
        Self {
            store,
            gateway,
            update_bus,
        }
    }

    /// Validates, prices and persists a `PENDING` booking, then asks the
    /// gateway for a payment session.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidRequest`] for a missing contact field.
    /// - [`ApiError::EventNotFound`] / [`ApiError::EventUnpublished`].
    /// - [`ApiError::SoldOut`] when the event has no booth left.
    /// - [`ApiError::Voucher`] when the voucher cannot be applied.
    /// - [`ApiError::PaymentGateway`] when the booking was stored but the
    ///   gateway call failed; the booking stays `PENDING`.
    pub async fn create_booking(&self, request: NewBooking) -> Result<CreatedBooking, ApiError> {
        if let Err((field, message)) = request.contact.validate() {
            return Err(ApiError::invalid_field(field, message));
        }

        let event = self
            .store
            .get_event(request.event_id)
            .await?
            .ok_or(ApiError::EventNotFound(request.event_id))?;
        if !event.is_published {
            return Err(ApiError::EventUnpublished(event.id));
        }
        if !event.has_capacity() {
            return Err(ApiError::SoldOut);
        }

        let code = request
            .voucher_code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());
        let discount = match code.as_deref() {
            Some(code) => {
                let found = self.store.find_voucher(code).await?;
                voucher::validate(found.as_ref(), event.id, Utc::now())
                    .map_err(ApiError::Voucher)?;
                found.map_or(0, |v| compute_discount(event.booth_price, &v))
            }
            None => 0,
        };

        let booking = Booking::pending(
            event.id,
            event.booth_price,
            discount,
            code,
            request.contact,
        );
        self.store.insert_booking(&booking).await?;

        tracing::info!(
            order_id = %booking.order_id,
            event_id = %booking.event_id,
            amount = booking.amount,
            voucher = booking.voucher_code.as_deref().unwrap_or("-"),
            remaining = ?event.remaining(),
            "booking created"
        );
        let _ = self.update_bus.publish(BookingUpdate::BookingCreated {
            order_id: booking.order_id.clone(),
            event_id: booking.event_id,
            amount: booking.amount,
            timestamp: booking.created_at,
        });

        if booking.amount == 0 {
            return Ok(CreatedBooking {
                booking,
                payment: None,
            });
        }

        let transaction = TransactionRequest {
            order_id: booking.order_id.clone(),
            gross_amount: booking.amount,
            customer: booking.contact.clone(),
            item_name: format!("Booth - {}", event.title),
        };
        let session = self.gateway.create_transaction(&transaction).await?;
        Ok(CreatedBooking {
            booking,
            payment: Some(session),
        })
    }

    /// Fetches a booking by its order id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BookingNotFound`] if no booking carries `order_id`.
    pub async fn get_booking(&self, order_id: &OrderId) -> Result<Booking, ApiError> {
        self.store
            .find_booking(order_id)
            .await?
            .ok_or_else(|| ApiError::BookingNotFound(order_id.to_string()))
    }

    /// Previews what `code` would do to the price of a booth at `event_id`.
    /// Touches no counters.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::EventNotFound`] for an unknown event.
    pub async fn check_voucher(&self, code: &str, event_id: Uuid) -> Result<VoucherQuote, ApiError> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(ApiError::EventNotFound(event_id))?;
        let base_price = event.booth_price;

        let found = self.store.find_voucher(&normalize_code(code)).await?;
        let discount = match voucher::validate(found.as_ref(), event.id, Utc::now()) {
            Ok(()) => found.map_or(0, |v| compute_discount(base_price, &v)),
            Err(rejection) => {
                return Ok(VoucherQuote {
                    rejection: Some(rejection),
                    base_price,
                    discount: 0,
                    amount: payable_amount(base_price, 0),
                });
            }
        };
        Ok(VoucherQuote {
            rejection: None,
            base_price,
            discount,
            amount: payable_amount(base_price, discount),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::domain::{BookingStatus, Event, Voucher, VoucherType};
    use crate::store::{BookingStore, MemoryStore};

    #[derive(Debug, Default)]
    struct RecordingGateway {
        fail: bool,
        calls: Mutex<Vec<TransactionRequest>>,
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn create_transaction(
            &self,
            request: &TransactionRequest,
        ) -> Result<PaymentSession, ApiError> {
            self.calls.lock().await.push(request.clone());
            if self.fail {
                return Err(ApiError::PaymentGateway("unreachable".to_string()));
            }
            Ok(PaymentSession {
                token: format!("tok-{}", request.order_id),
                redirect_url: format!("https://pay.example/{}", request.order_id),
            })
        }
    }

    fn contact() -> ContactDetails {
        ContactDetails {
            name: "Dewi".to_string(),
            email: "dewi@campus.example".to_string(),
            phone: "+62 812 0000".to_string(),
            company: Some("Campus Abroad".to_string()),
            notes: None,
        }
    }

    fn event(quota: Option<i64>, sold: i64) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Study Abroad Expo".to_string(),
            is_published: true,
            booth_price: 100_000,
            booth_quota: quota,
            booth_sold_count: sold,
        }
    }

    fn voucher(code: &str, voucher_type: VoucherType, value: i64, cap: Option<i64>) -> Voucher {
        Voucher {
            id: Uuid::new_v4(),
            code: code.to_string(),
            voucher_type,
            value,
            max_discount: cap,
            is_active: true,
            max_uses: None,
            used_count: 0,
            valid_from: None,
            valid_to: None,
            event_id: None,
        }
    }

    async fn setup(ev: &Event, fail: bool) -> (BookingService, Arc<RecordingGateway>) {
        let store = Arc::new(MemoryStore::new());
        let _ = store.insert_event(ev).await;
        let _ = store
            .insert_voucher(&voucher("HALF", VoucherType::Percent, 50, Some(40_000)))
            .await;
        let _ = store
            .insert_voucher(&voucher("FREE", VoucherType::Fixed, 250_000, None))
            .await;
        let gateway = Arc::new(RecordingGateway {
            fail,
            ..RecordingGateway::default()
        });
        let service = BookingService::new(
            store,
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
            UpdateBus::new(16),
        );
        (service, gateway)
    }

    fn request(event_id: Uuid, code: Option<&str>) -> NewBooking {
        NewBooking {
            event_id,
            contact: contact(),
            voucher_code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn capped_percent_voucher_prices_booking() {
        let ev = event(Some(1), 0);
        let (service, gateway) = setup(&ev, false).await;

        let result = service.create_booking(request(ev.id, Some(" half "))).await;
        let Ok(created) = result else {
            panic!("expected booking, got {result:?}");
        };
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.discount, 40_000);
        assert_eq!(created.booking.amount, 60_000);
        assert_eq!(created.booking.voucher_code.as_deref(), Some("HALF"));
        assert!(created.payment.is_some());

        let calls = gateway.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls.first().map(|c| c.gross_amount), Some(60_000));
    }

    #[tokio::test]
    async fn free_booking_skips_gateway() {
        let ev = event(None, 0);
        let (service, gateway) = setup(&ev, false).await;

        let Ok(created) = service.create_booking(request(ev.id, Some("FREE"))).await else {
            panic!("expected booking");
        };
        assert_eq!(created.booking.amount, 0);
        assert!(created.payment.is_none());
        assert!(gateway.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn sold_out_event_is_rejected() {
        let ev = event(Some(2), 2);
        let (service, _) = setup(&ev, false).await;
        let result = service.create_booking(request(ev.id, None)).await;
        assert!(matches!(result, Err(ApiError::SoldOut)));
    }

    #[tokio::test]
    async fn unpublished_and_missing_events_are_rejected() {
        let mut ev = event(None, 0);
        ev.is_published = false;
        let (service, _) = setup(&ev, false).await;

        let result = service.create_booking(request(ev.id, None)).await;
        assert!(matches!(result, Err(ApiError::EventUnpublished(_))));

        let result = service.create_booking(request(Uuid::new_v4(), None)).await;
        assert!(matches!(result, Err(ApiError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn unknown_voucher_is_a_field_error() {
        let ev = event(None, 0);
        let (service, _) = setup(&ev, false).await;
        let result = service.create_booking(request(ev.id, Some("NOPE"))).await;
        let Err(err) = result else {
            panic!("expected voucher error");
        };
        assert!(matches!(err, ApiError::Voucher(VoucherRejection::InvalidCode)));
        assert_eq!(err.field(), Some("voucher_code"));
    }

    #[tokio::test]
    async fn blank_voucher_is_ignored() {
        let ev = event(None, 0);
        let (service, _) = setup(&ev, false).await;
        let Ok(created) = service.create_booking(request(ev.id, Some("   "))).await else {
            panic!("expected booking");
        };
        assert_eq!(created.booking.amount, 100_000);
        assert!(created.booking.voucher_code.is_none());
    }

    #[tokio::test]
    async fn invalid_contact_names_the_field() {
        let ev = event(None, 0);
        let (service, _) = setup(&ev, false).await;
        let mut req = request(ev.id, None);
        req.contact.email = "not-an-email".to_string();
        let Err(err) = service.create_booking(req).await else {
            panic!("expected validation error");
        };
        assert_eq!(err.field(), Some("email"));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_pending_booking() {
        let ev = event(None, 0);
        let (service, gateway) = setup(&ev, true).await;

        let result = service.create_booking(request(ev.id, None)).await;
        assert!(matches!(result, Err(ApiError::PaymentGateway(_))));

        let calls = gateway.calls.lock().await;
        let Some(order_id) = calls.first().map(|c| c.order_id.clone()) else {
            panic!("gateway never called");
        };
        let Ok(stored) = service.get_booking(&order_id).await else {
            panic!("booking not persisted");
        };
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn creation_publishes_update() {
        let ev = event(None, 0);
        let (service, _) = setup(&ev, false).await;
        let mut rx = service.update_bus.subscribe();

        let Ok(created) = service.create_booking(request(ev.id, None)).await else {
            panic!("expected booking");
        };
        let Ok(update) = rx.try_recv() else {
            panic!("no update published");
        };
        assert_eq!(update.order_id(), &created.booking.order_id);
        assert_eq!(update.event_type_str(), "booking_created");
    }

    #[tokio::test]
    async fn voucher_preview_reports_rejection_without_error() {
        let ev = event(None, 0);
        let (service, _) = setup(&ev, false).await;

        let Ok(quote) = service.check_voucher("half", ev.id).await else {
            panic!("expected quote");
        };
        assert_eq!(quote.rejection, None);
        assert_eq!(quote.amount, 60_000);

        let Ok(quote) = service.check_voucher("missing", ev.id).await else {
            panic!("expected quote");
        };
        assert_eq!(quote.rejection, Some(VoucherRejection::InvalidCode));
        assert_eq!(quote.amount, 100_000);
    }
}
