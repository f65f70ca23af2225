// app/src/config.rs

use crate::errors::{AppError, Result};
use crate::services::provider::PayPalCredentials;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Settings the checkout and reconciliation core needs, injected explicitly.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
  pub currency: String,
  pub return_url: String,
  pub cancel_url: String,
  pub provider_timeout: Duration,
}

impl Default for CheckoutSettings {
  fn default() -> Self {
    Self {
      currency: "USD".to_string(),
      return_url: "http://127.0.0.1:8080/checkout/return".to_string(),
      cancel_url: "http://127.0.0.1:8080/checkout/cancel".to_string(),
      provider_timeout: Duration::from_secs(10),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
  Mock,
  PayPal,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub provider: ProviderKind,
  pub paypal: Option<PayPalCredentials>,
  pub checkout: CheckoutSettings,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
    let require = |name: &str| {
      lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)))
    };

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_or("DATABASE_URL", "sqlite://sealcart.db");

    let provider = match get_or("PAYMENT_PROVIDER", "mock").to_ascii_lowercase().as_str() {
      "mock" => ProviderKind::Mock,
      "paypal" => ProviderKind::PayPal,
      other => {
        return Err(AppError::Config(format!(
          "Invalid PAYMENT_PROVIDER '{}' (expected 'mock' or 'paypal')",
          other
        )))
      }
    };

    let paypal = match provider {
      ProviderKind::PayPal => Some(PayPalCredentials {
        client_id: require("PAYPAL_CLIENT_ID")?,
        secret: require("PAYPAL_SECRET")?,
        api_base: get_or("PAYPAL_API_BASE", "https://api-m.sandbox.paypal.com"),
      }),
      ProviderKind::Mock => None,
    };

    let base_url = format!("http://{}:{}", server_host, server_port);
    let provider_timeout_secs = get_or("PROVIDER_TIMEOUT_SECS", "10")
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid PROVIDER_TIMEOUT_SECS: {}", e)))?;
    if provider_timeout_secs == 0 {
      return Err(AppError::Config("PROVIDER_TIMEOUT_SECS must be positive".to_string()));
    }

    let checkout = CheckoutSettings {
      currency: get_or("STORE_CURRENCY", "USD").to_ascii_uppercase(),
      return_url: get_or("CHECKOUT_RETURN_URL", &format!("{}/checkout/return", base_url)),
      cancel_url: get_or("CHECKOUT_CANCEL_URL", &format!("{}/checkout/cancel", base_url)),
      provider_timeout: Duration::from_secs(provider_timeout_secs),
    };

    tracing::info!(
      server_host = %server_host,
      server_port,
      provider = ?provider,
      currency = %checkout.currency,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      provider,
      paypal,
      checkout,
    })
  }
}
