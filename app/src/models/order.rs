// app/src/models/order.rs
use crate::digest::OrderCommitment;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Approved,
  Failed,
  Refunded,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Approved => "approved",
      OrderStatus::Failed => "failed",
      OrderStatus::Refunded => "refunded",
    }
  }

  /// Terminal orders are never reconciled again.
  pub fn is_terminal(self) -> bool {
    !matches!(self, OrderStatus::Pending)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "approved" => Ok(OrderStatus::Approved),
      "failed" => Ok(OrderStatus::Failed),
      "refunded" => Ok(OrderStatus::Refunded),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

/// A persisted line: the price is the price at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
  pub product_id: i64,
  pub quantity: u32,
  pub unit_price: Money,
}

/// Everything the store needs to create a pending order.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub invoice: String,
  pub currency: String,
  pub email: String,
  pub user_id: Option<i64>,
  pub username: String,
  pub salt: String,
  pub digest: String,
  pub total: Money,
  pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
  pub id: i64,
  pub invoice: String,
  pub currency: String,
  pub email: String,
  pub user_id: Option<i64>,
  pub username: String,
  pub salt: String,
  pub digest: String,
  pub total: Money,
  pub status: OrderStatus,
  pub items: Vec<LineItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// The commitment as re-derived from persisted values only.
  pub fn commitment(&self) -> OrderCommitment<'_> {
    OrderCommitment {
      currency: &self.currency,
      merchant: &self.email,
      salt: &self.salt,
      items: &self.items,
      total: self.total,
    }
  }
}

/// Ledger snapshot of an order at the moment it was verified.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedOrder {
  pub id: i64,
  pub order_id: i64,
  pub invoice: String,
  pub user_id: Option<i64>,
  pub username: String,
  pub email: String,
  pub total: Money,
  pub currency: String,
  pub status: OrderStatus,
  pub items: Vec<LineItem>,
  pub verified_at: DateTime<Utc>,
}
