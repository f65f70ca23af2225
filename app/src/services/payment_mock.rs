// app/src/services/payment_mock.rs
use crate::services::provider::{PaymentProvider, ProviderError, ProviderOrder, ProviderOrderRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Sandbox provider with switchable failure and latency.
///
/// Approval URLs are deterministic per invoice so tests can assert on them.
pub struct MockPaymentProvider {
  base_url: String,
  failing: AtomicBool,
  latency: Mutex<Option<Duration>>,
  calls: AtomicUsize,
  last_request: Mutex<Option<ProviderOrderRequest>>,
}

impl MockPaymentProvider {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      failing: AtomicBool::new(false),
      latency: Mutex::new(None),
      calls: AtomicUsize::new(0),
      last_request: Mutex::new(None),
    }
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn set_latency(&self, latency: Option<Duration>) {
    *self.latency.lock() = latency;
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_request(&self) -> Option<ProviderOrderRequest> {
    self.last_request.lock().clone()
  }

  pub fn approval_url_for(&self, invoice: &str) -> String {
    format!("{}/checkoutnow?token=MOCK-{}", self.base_url.trim_end_matches('/'), invoice)
  }
}

impl Default for MockPaymentProvider {
  fn default() -> Self {
    Self::new("https://sandbox.payments.test")
  }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
  fn name(&self) -> &'static str {
    "mock"
  }

  #[instrument(name = "MockPaymentProvider::create_order", skip_all, fields(invoice = %request.invoice, amount = %request.amount))]
  async fn create_order(&self, request: &ProviderOrderRequest) -> Result<ProviderOrder, ProviderError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_request.lock() = Some(request.clone());

    let latency = *self.latency.lock();
    if let Some(delay) = latency {
      tokio::time::sleep(delay).await;
    }

    if self.failing.load(Ordering::SeqCst) {
      info!("Mock provider configured to fail.");
      return Err(ProviderError::Unavailable("mock provider switched off".to_string()));
    }

    Ok(ProviderOrder {
      provider_order_id: format!("MOCK-{}", Uuid::new_v4().simple()),
      approval_url: self.approval_url_for(&request.invoice),
    })
  }
}
