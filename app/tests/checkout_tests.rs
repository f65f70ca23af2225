// app/tests/checkout_tests.rs
mod common;

use common::*;
use sealcart::config::CheckoutSettings;
use sealcart::digest;
use sealcart::models::OrderStatus;
use sealcart::money::Money;
use sealcart::AppError;
use std::time::Duration;

#[tokio::test]
async fn checkout_seals_and_persists_pending_order() {
  let h = harness().await;

  let response = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap();
  assert_eq!(response.invoice, "INV-100");
  assert_eq!(response.approval_url, h.provider.approval_url_for("INV-100"));

  let order = h.store.find_by_invoice("INV-100").await.unwrap().unwrap();
  assert_eq!(order.id, response.order_id);
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.total.to_string(), "39.98");
  assert_eq!(order.currency, "USD");
  assert_eq!(order.username, "guest");
  assert_eq!(order.items.len(), 1);
  assert_eq!(order.items[0].unit_price, Money::from_minor(1999));
  assert_eq!(order.items[0].quantity, 2);

  let expected = digest::digest("USD", BUYER, &order.salt, &order.items, order.total);
  assert_eq!(order.digest, expected);

  let sent = h.provider.last_request().unwrap();
  assert_eq!(sent.amount, Money::from_minor(3998));
  assert_eq!(sent.currency, "USD");
  assert_eq!(sent.invoice, "INV-100");
  assert_eq!(sent.items[0].name, "Product 1");
  assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn identical_carts_get_distinct_salts_and_digests() {
  let h = harness().await;
  h.state.checkout.initiate_checkout(cart_request("INV-A", &[(1, 19.99, 2)])).await.unwrap();
  h.state.checkout.initiate_checkout(cart_request("INV-B", &[(1, 19.99, 2)])).await.unwrap();

  let a = h.store.find_by_invoice("INV-A").await.unwrap().unwrap();
  let b = h.store.find_by_invoice("INV-B").await.unwrap().unwrap();
  assert_ne!(a.salt, b.salt);
  assert_ne!(a.digest, b.digest);
}

#[tokio::test]
async fn invalid_carts_are_rejected_before_persistence() {
  let h = harness().await;
  let cases = vec![
    cart_request("INV-1", &[(1, 19.999, 1)]),
    cart_request("INV-2", &[(1, 0.0, 1)]),
    cart_request("INV-3", &[(1, -5.0, 1)]),
    cart_request("INV-4", &[(1, 1.0, 0)]),
    cart_request("INV-5", &[]),
    cart_request("", &[(1, 1.0, 1)]),
    cart_request("   ", &[(1, 1.0, 1)]),
    cart_request("INV-6", &[(1, 7.9e28, 1)]),
  ];
  for request in cases {
    let invoice = request.invoice.clone();
    let err = h.state.checkout.initiate_checkout(request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{}: {:?}", invoice, err);
  }

  let mut bad_email = inv100_request();
  bad_email.email = "not-an-email".into();
  assert!(matches!(
    h.state.checkout.initiate_checkout(bad_email).await,
    Err(AppError::Validation(_))
  ));

  assert!(h.store.list_orders().await.unwrap().is_empty());
  assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn huge_price_is_a_validation_error() {
  let h = harness().await;
  let mut request = inv100_request();
  request.cart_items[0].price = serde_json::from_str("\"79228162514264337593543950335\"").unwrap();

  let err = h.state.checkout.initiate_checkout(request).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
  assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn invoice_is_stored_trimmed() {
  let h = harness().await;
  h.state.checkout.initiate_checkout(cart_request("  INV-PAD\t", &[(1, 1.0, 1)])).await.unwrap();

  let order = h.store.find_by_invoice("INV-PAD").await.unwrap().unwrap();
  assert_eq!(order.invoice, "INV-PAD");
}

#[tokio::test]
async fn total_is_computed_server_side() {
  let h = harness().await;
  let mut request = cart_request("INV-SUM", &[(1, 0.10, 3), (2, 0.20, 1)]);
  request.username = Some("alice".into());
  request.user_id = Some(42);

  h.state.checkout.initiate_checkout(request).await.unwrap();
  let order = h.store.find_by_invoice("INV-SUM").await.unwrap().unwrap();
  assert_eq!(order.total, Money::from_minor(50));
  assert_eq!(order.username, "alice");
  assert_eq!(order.user_id, Some(42));
  assert_eq!(order.items[1].product_id, 2);
}

#[tokio::test]
async fn duplicate_invoice_conflicts() {
  let h = harness().await;
  h.state.checkout.initiate_checkout(inv100_request()).await.unwrap();

  let err = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap_err();
  assert!(matches!(err, AppError::Conflict(_)), "{:?}", err);
  assert_eq!(h.provider.call_count(), 1);
  assert_eq!(h.store.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_order_frees_its_invoice() {
  let h = harness().await;
  let first = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap();
  sqlx::query("UPDATE orders SET status = 'failed' WHERE id = ?")
    .bind(first.order_id)
    .execute(h.store.pool())
    .await
    .unwrap();

  let second = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap();
  assert_ne!(first.order_id, second.order_id);
  let live = h.store.find_by_invoice("INV-100").await.unwrap().unwrap();
  assert_eq!(live.id, second.order_id);
}

#[tokio::test]
async fn store_failure_never_reaches_provider() {
  let h = harness().await;
  h.store.close().await;

  let err = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap_err();
  assert!(matches!(err, AppError::StoreUnavailable(_)), "{:?}", err);
  assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn provider_failure_leaves_order_pending() {
  let h = harness().await;
  h.provider.set_failing(true);

  let err = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap_err();
  assert!(matches!(err, AppError::Provider(_)), "{:?}", err);

  let order = h.store.find_by_invoice("INV-100").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn provider_timeout_leaves_order_pending() {
  let h = harness_with(CheckoutSettings {
    provider_timeout: Duration::from_millis(50),
    ..CheckoutSettings::default()
  })
  .await;
  h.provider.set_latency(Some(Duration::from_secs(2)));

  let err = h.state.checkout.initiate_checkout(inv100_request()).await.unwrap_err();
  assert!(matches!(err, AppError::Provider(_)), "{:?}", err);
  let order = h.store.find_by_invoice("INV-100").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn currency_comes_from_settings() {
  let h = harness_with(CheckoutSettings {
    currency: "HKD".into(),
    ..CheckoutSettings::default()
  })
  .await;
  h.state.checkout.initiate_checkout(inv100_request()).await.unwrap();

  let order = h.store.find_by_invoice("INV-100").await.unwrap().unwrap();
  assert_eq!(order.currency, "HKD");
  assert_eq!(h.provider.last_request().unwrap().currency, "HKD");
  assert!(order.commitment().matches(&order.digest));
}
