// app/tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use sealcart::config::CheckoutSettings;
use sealcart::models::CheckoutRequest;
use sealcart::services::alerts::RecordingAlertSink;
use sealcart::services::payment_mock::MockPaymentProvider;
use sealcart::store::OrderStore;
use sealcart::AppState;
use serde_json::json;
use std::sync::Arc;
use tracing::Level;

pub const BUYER: &str = "buyer@example.com";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub struct Harness {
  pub state: AppState,
  pub store: OrderStore,
  pub provider: Arc<MockPaymentProvider>,
  pub alerts: Arc<RecordingAlertSink>,
}

pub async fn harness() -> Harness {
  harness_with(CheckoutSettings::default()).await
}

pub async fn harness_with(settings: CheckoutSettings) -> Harness {
  setup_tracing();
  let store = OrderStore::in_memory().await.expect("in-memory store");
  let provider = Arc::new(MockPaymentProvider::default());
  let alerts = Arc::new(RecordingAlertSink::default());
  let state = AppState::new(store.clone(), provider.clone(), alerts.clone(), settings);
  Harness {
    state,
    store,
    provider,
    alerts,
  }
}

/// `(product_id, price, quantity)` triples; prices go through JSON like a client's would.
pub fn cart_request(invoice: &str, items: &[(i64, f64, i64)]) -> CheckoutRequest {
  let cart: Vec<_> = items
    .iter()
    .map(|(id, price, quantity)| json!({ "id": id, "name": format!("Product {}", id), "price": price, "quantity": quantity }))
    .collect();
  serde_json::from_value(json!({ "cartItems": cart, "invoice": invoice, "email": BUYER })).expect("valid request json")
}

pub fn inv100_request() -> CheckoutRequest {
  cart_request("INV-100", &[(1, 19.99, 2)])
}

pub fn approval_payload(invoice: &str) -> Vec<u8> {
  json!({
    "id": "WH-1",
    "event_type": "CHECKOUT.ORDER.APPROVED",
    "resource": {
      "id": "5O190127TN364715T",
      "status": "APPROVED",
      "purchase_units": [{ "reference_id": invoice }]
    }
  })
  .to_string()
  .into_bytes()
}

pub fn event_payload(event_type: &str, status: &str, invoice: &str) -> Vec<u8> {
  json!({
    "event_type": event_type,
    "resource": { "status": status, "purchase_units": [{ "reference_id": invoice }] }
  })
  .to_string()
  .into_bytes()
}

/// Rewrites a persisted line price behind the application's back.
pub async fn tamper_price(store: &OrderStore, order_id: i64, price_minor: i64) {
  sqlx::query("UPDATE order_line_items SET price_minor = ? WHERE order_id = ? AND position = 0")
    .bind(price_minor)
    .bind(order_id)
    .execute(store.pool())
    .await
    .expect("tamper update");
}
