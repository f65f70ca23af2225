// app/src/services/provider.rs

//! Outbound payment provider: creates a provider-side order and returns the
//! URL the buyer is sent to for approval.

use crate::money::Money;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("provider transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("provider authentication failed: {0}")]
  Auth(String),

  #[error("provider rejected the order ({status}): {body}")]
  Rejected { status: u16, body: String },

  #[error("provider response has no approval link")]
  MissingApprovalLink,

  #[error("provider unavailable: {0}")]
  Unavailable(String),
}

/// Display-only line for the provider's checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderItem {
  pub sku: i64,
  pub name: String,
  pub quantity: u32,
  pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrderRequest {
  pub invoice: String,
  pub amount: Money,
  pub currency: String,
  pub items: Vec<ProviderItem>,
  pub return_url: String,
  pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrder {
  pub provider_order_id: String,
  pub approval_url: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
  fn name(&self) -> &'static str;

  async fn create_order(&self, request: &ProviderOrderRequest) -> Result<ProviderOrder, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct PayPalCredentials {
  pub client_id: String,
  pub secret: String,
  pub api_base: String,
}

/// PayPal Orders v2 over REST, authenticated with client credentials.
pub struct PayPalProvider {
  client: reqwest::Client,
  credentials: PayPalCredentials,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
}

#[derive(Deserialize)]
struct OrderResponse {
  id: String,
  #[serde(default)]
  links: Vec<LinkDescription>,
}

#[derive(Deserialize)]
struct LinkDescription {
  href: String,
  rel: String,
}

impl PayPalProvider {
  pub fn new(credentials: PayPalCredentials) -> Self {
    Self {
      client: reqwest::Client::new(),
      credentials,
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.credentials.api_base.trim_end_matches('/'), path)
  }

  async fn access_token(&self) -> Result<String, ProviderError> {
    let response = self
      .client
      .post(self.url("/v1/oauth2/token"))
      .basic_auth(&self.credentials.client_id, Some(&self.credentials.secret))
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ProviderError::Auth(format!("{}: {}", status, body)));
    }
    Ok(response.json::<TokenResponse>().await?.access_token)
  }

  fn order_body(request: &ProviderOrderRequest) -> serde_json::Value {
    let money = |amount: Money| json!({ "currency_code": request.currency, "value": amount.to_string() });
    let items: Vec<_> = request
      .items
      .iter()
      .map(|item| {
        json!({
          "name": item.name,
          "sku": item.sku.to_string(),
          "quantity": item.quantity.to_string(),
          "unit_amount": money(item.unit_price),
        })
      })
      .collect();

    json!({
      "intent": "CAPTURE",
      "purchase_units": [{
        "reference_id": request.invoice,
        "custom_id": request.invoice,
        "invoice_id": request.invoice,
        "amount": {
          "currency_code": request.currency,
          "value": request.amount.to_string(),
          "breakdown": { "item_total": money(request.amount) },
        },
        "items": items,
      }],
      "application_context": {
        "return_url": request.return_url,
        "cancel_url": request.cancel_url,
        "user_action": "PAY_NOW",
      },
    })
  }
}

/// `approve` is the classic link; newer payment sources answer with `payer-action`.
fn approval_link(links: &[LinkDescription]) -> Option<&str> {
  ["approve", "payer-action"]
    .iter()
    .find_map(|rel| links.iter().find(|link| link.rel == *rel))
    .map(|link| link.href.as_str())
}

#[async_trait]
impl PaymentProvider for PayPalProvider {
  fn name(&self) -> &'static str {
    "paypal"
  }

  #[instrument(name = "PayPalProvider::create_order", skip_all, fields(invoice = %request.invoice, amount = %request.amount))]
  async fn create_order(&self, request: &ProviderOrderRequest) -> Result<ProviderOrder, ProviderError> {
    let token = self.access_token().await?;
    debug!("Obtained provider access token.");

    let response = self
      .client
      .post(self.url("/v2/checkout/orders"))
      .bearer_auth(token)
      .json(&Self::order_body(request))
      .send()
      .await?;

    let status = response.status();
    if status.is_server_error() {
      let body = response.text().await.unwrap_or_default();
      return Err(ProviderError::Unavailable(format!("{}: {}", status, body)));
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ProviderError::Rejected {
        status: status.as_u16(),
        body,
      });
    }

    let order: OrderResponse = response.json().await?;
    let approval_url = approval_link(&order.links)
      .ok_or(ProviderError::MissingApprovalLink)?
      .to_string();
    info!(provider_order_id = %order.id, "Provider order created.");
    Ok(ProviderOrder {
      provider_order_id: order.id,
      approval_url,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn link(rel: &str, href: &str) -> LinkDescription {
    LinkDescription {
      rel: rel.into(),
      href: href.into(),
    }
  }

  #[test]
  fn prefers_approve_then_payer_action() {
    let links = vec![link("self", "s"), link("payer-action", "p"), link("approve", "a")];
    assert_eq!(approval_link(&links), Some("a"));

    let links = vec![link("self", "s"), link("payer-action", "p")];
    assert_eq!(approval_link(&links), Some("p"));

    assert_eq!(approval_link(&[link("self", "s")]), None);
  }

  #[test]
  fn order_body_carries_invoice_and_amounts() {
    let request = ProviderOrderRequest {
      invoice: "INV-100".into(),
      amount: Money::from_minor(3998),
      currency: "USD".into(),
      items: vec![ProviderItem {
        sku: 1,
        name: "Mug".into(),
        quantity: 2,
        unit_price: Money::from_minor(1999),
      }],
      return_url: "https://shop.example/return".into(),
      cancel_url: "https://shop.example/cancel".into(),
    };
    let body = PayPalProvider::order_body(&request);
    let unit = &body["purchase_units"][0];
    assert_eq!(unit["reference_id"], "INV-100");
    assert_eq!(unit["amount"]["value"], "39.98");
    assert_eq!(unit["items"][0]["unit_amount"]["value"], "19.99");
    assert_eq!(unit["items"][0]["quantity"], "2");
    assert_eq!(body["application_context"]["return_url"], "https://shop.example/return");
  }
}
