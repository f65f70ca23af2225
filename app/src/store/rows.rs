// app/src/store/rows.rs

//! Raw row shapes and their conversion into domain models.

use super::error::StoreError;
use crate::models::{LineItem, Order, OrderStatus, VerifiedOrder};
use crate::money::Money;
use chrono::{DateTime, Utc};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
  pub id: i64,
  pub invoice: String,
  pub currency: String,
  pub email: String,
  pub user_id: Option<i64>,
  pub username: String,
  pub salt: String,
  pub digest: String,
  pub total_minor: i64,
  pub status: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LineItemRow {
  pub product_id: i64,
  pub quantity: i64,
  pub price_minor: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct VerifiedOrderRow {
  pub id: i64,
  pub order_id: i64,
  pub invoice: String,
  pub user_id: Option<i64>,
  pub username: String,
  pub email: String,
  pub total_minor: i64,
  pub currency: String,
  pub status: String,
  pub verified_at: DateTime<Utc>,
}

fn parse_status(raw: &str) -> Result<OrderStatus, StoreError> {
  raw.parse().map_err(StoreError::Corrupt)
}

impl TryFrom<LineItemRow> for LineItem {
  type Error = StoreError;

  fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
    let quantity = u32::try_from(row.quantity)
      .map_err(|_| StoreError::Corrupt(format!("line quantity {} out of range", row.quantity)))?;
    Ok(LineItem {
      product_id: row.product_id,
      quantity,
      unit_price: Money::from_minor(row.price_minor),
    })
  }
}

pub(crate) fn into_items(rows: Vec<LineItemRow>) -> Result<Vec<LineItem>, StoreError> {
  rows.into_iter().map(LineItem::try_from).collect()
}

impl OrderRow {
  pub fn into_order(self, items: Vec<LineItem>) -> Result<Order, StoreError> {
    Ok(Order {
      status: parse_status(&self.status)?,
      id: self.id,
      invoice: self.invoice,
      currency: self.currency,
      email: self.email,
      user_id: self.user_id,
      username: self.username,
      salt: self.salt,
      digest: self.digest,
      total: Money::from_minor(self.total_minor),
      items,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

impl VerifiedOrderRow {
  pub fn into_verified(self, items: Vec<LineItem>) -> Result<VerifiedOrder, StoreError> {
    Ok(VerifiedOrder {
      status: parse_status(&self.status)?,
      id: self.id,
      order_id: self.order_id,
      invoice: self.invoice,
      user_id: self.user_id,
      username: self.username,
      email: self.email,
      total: Money::from_minor(self.total_minor),
      currency: self.currency,
      items,
      verified_at: self.verified_at,
    })
  }
}
