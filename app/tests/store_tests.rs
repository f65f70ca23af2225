// app/tests/store_tests.rs
mod common;

use common::*;
use sealcart::digest::{digest, generate_salt};
use sealcart::models::{LineItem, NewOrder, OrderStatus};
use sealcart::money::Money;
use sealcart::store::{LedgerWrite, OrderStore, StoreError};

fn new_order(invoice: &str, email: &str) -> NewOrder {
  let items = vec![LineItem {
    product_id: 1,
    quantity: 2,
    unit_price: Money::from_minor(1999),
  }];
  let total = Money::from_minor(3998);
  let salt = generate_salt();
  NewOrder {
    invoice: invoice.to_string(),
    currency: "USD".to_string(),
    email: email.to_string(),
    user_id: None,
    username: "guest".to_string(),
    digest: digest("USD", email, &salt, &items, total),
    salt,
    total,
    items,
  }
}

async fn store() -> OrderStore {
  setup_tracing();
  OrderStore::in_memory().await.unwrap()
}

#[tokio::test]
async fn insert_and_reload_round_trip() {
  let store = store().await;
  let created = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();
  let loaded = store.find_by_invoice("INV-1").await.unwrap().unwrap();

  assert_eq!(loaded.id, created.id);
  assert_eq!(loaded.status, OrderStatus::Pending);
  assert_eq!(loaded.items, created.items);
  assert_eq!(loaded.digest, created.digest);
  assert!(loaded.commitment().matches(&loaded.digest));
  assert!(store.find_by_id(created.id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_live_invoice_is_rejected() {
  let store = store().await;
  store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();
  let err = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap_err();
  assert!(matches!(err, StoreError::DuplicateInvoice(ref inv) if inv == "INV-1"), "{:?}", err);
}

#[tokio::test]
async fn record_verification_is_once_only() {
  let store = store().await;
  let order = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();

  assert!(matches!(store.record_verification(&order).await.unwrap(), LedgerWrite::Recorded(_)));
  assert!(matches!(
    store.record_verification(&order).await.unwrap(),
    LedgerWrite::AlreadyVerified
  ));
  assert_eq!(store.count_verified("INV-1").await.unwrap(), 1);
}

#[tokio::test]
async fn ledger_conflict_rolls_back_status_flip() {
  let store = store().await;
  let first = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();
  store.record_verification(&first).await.unwrap();

  // Free the invoice so a second order can exist while the ledger already holds it.
  sqlx::query("UPDATE orders SET status = 'failed' WHERE id = ?")
    .bind(first.id)
    .execute(store.pool())
    .await
    .unwrap();
  let second = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();

  assert!(matches!(
    store.record_verification(&second).await.unwrap(),
    LedgerWrite::AlreadyVerified
  ));
  let reloaded = store.find_by_id(second.id).await.unwrap().unwrap();
  assert_eq!(reloaded.status, OrderStatus::Pending);
  assert_eq!(store.count_verified("INV-1").await.unwrap(), 1);
}

#[tokio::test]
async fn ledger_rejects_update_and_delete() {
  let store = store().await;
  let order = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();
  store.record_verification(&order).await.unwrap();

  for sql in [
    "UPDATE verified_orders SET total_minor = 1",
    "DELETE FROM verified_orders",
    "UPDATE verified_order_line_items SET price_minor = 1",
    "DELETE FROM verified_order_line_items",
  ] {
    let result = sqlx::query(sql).execute(store.pool()).await;
    assert!(result.is_err(), "{} should be rejected", sql);
  }
  let verified = store.find_verified("INV-1").await.unwrap().unwrap();
  assert_eq!(verified.total, Money::from_minor(3998));
  assert_eq!(verified.items.len(), 1);
}

#[tokio::test]
async fn orders_are_never_deleted_and_commitment_is_immutable() {
  let store = store().await;
  let order = store.insert_order(&new_order("INV-1", BUYER)).await.unwrap();

  assert!(sqlx::query("DELETE FROM orders").execute(store.pool()).await.is_err());
  assert!(sqlx::query("UPDATE orders SET digest = ? WHERE id = ?")
    .bind("0".repeat(64))
    .bind(order.id)
    .execute(store.pool())
    .await
    .is_err());
  assert!(sqlx::query("UPDATE orders SET salt = 'x' WHERE id = ?")
    .bind(order.id)
    .execute(store.pool())
    .await
    .is_err());

  let reloaded = store.find_by_id(order.id).await.unwrap().unwrap();
  assert_eq!(reloaded.digest, order.digest);
}

#[tokio::test]
async fn recent_orders_by_email_returns_newest_five() {
  let store = store().await;
  for n in 0..7 {
    store.insert_order(&new_order(&format!("INV-{}", n), BUYER)).await.unwrap();
  }
  store.insert_order(&new_order("INV-OTHER", "other@example.com")).await.unwrap();

  let recent = store.recent_orders_by_email(BUYER, 5).await.unwrap();
  let invoices: Vec<_> = recent.iter().map(|o| o.invoice.as_str()).collect();
  assert_eq!(invoices, vec!["INV-6", "INV-5", "INV-4", "INV-3", "INV-2"]);

  let all = store.list_orders().await.unwrap();
  assert_eq!(all.len(), 8);
  assert_eq!(all[0].invoice, "INV-OTHER");
}

#[tokio::test]
async fn closed_store_reports_unavailable() {
  let store = store().await;
  store.close().await;
  assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
}
