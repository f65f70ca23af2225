// app/src/models/checkout.rs
use crate::money::AmountInput;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const GUEST_USERNAME: &str = "guest";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CartItemRequest {
  pub id: i64,
  #[serde(default)]
  pub name: Option<String>,
  pub price: AmountInput,
  pub quantity: i64,
}

/// Body of `POST /checkout`. Any client-side total is ignored.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CheckoutRequest {
  #[serde(rename = "cartItems")]
  #[validate(length(min = 1, message = "cart must contain at least one item"))]
  pub cart_items: Vec<CartItemRequest>,

  #[validate(length(min = 1, max = 127, message = "invoice must be 1 to 127 characters"))]
  pub invoice: String,

  #[validate(email(message = "email is not a valid address"))]
  pub email: String,

  #[serde(default)]
  pub user_id: Option<i64>,

  #[serde(default)]
  pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
  pub approval_url: String,
  pub order_id: i64,
  pub invoice: String,
}
