// app/src/digest.rs

//! Salted SHA-256 commitment over an order's contents.
//!
//! Canonical form: every line rendered as `product_id:quantity:price` and
//! joined with `|`, then `currency || merchant || salt || lines || total`.
//! Prices always carry exactly two decimals. The result is lowercase hex.
//!
//! There is no secret involved: this detects edits to stored orders, it does
//! not authenticate anyone.

use crate::models::LineItem;
use crate::money::Money;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Borrowed inputs of a digest, shared by checkout and reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct OrderCommitment<'a> {
  pub currency: &'a str,
  pub merchant: &'a str,
  pub salt: &'a str,
  pub items: &'a [LineItem],
  pub total: Money,
}

impl OrderCommitment<'_> {
  pub fn canonical_string(&self) -> String {
    let lines = self
      .items
      .iter()
      .map(|item| format!("{}:{}:{}", item.product_id, item.quantity, item.unit_price))
      .collect::<Vec<_>>()
      .join("|");
    let total = self.total.to_string();
    [self.currency, self.merchant, self.salt, lines.as_str(), total.as_str()].join("||")
  }

  pub fn digest(&self) -> String {
    hex::encode(Sha256::digest(self.canonical_string().as_bytes()))
  }

  /// Exact comparison against a stored digest.
  pub fn matches(&self, stored_digest: &str) -> bool {
    self.digest() == stored_digest
  }
}

pub fn digest(currency: &str, merchant: &str, salt: &str, items: &[LineItem], total: Money) -> String {
  OrderCommitment {
    currency,
    merchant,
    salt,
    items,
    total,
  }
  .digest()
}

/// `<unix-nanos>-<uuid v4 simple>`; one per order, never reused.
pub fn generate_salt() -> String {
  let nanos = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_nanos())
    .unwrap_or_default();
  format!("{}-{}", nanos, Uuid::new_v4().simple())
}
