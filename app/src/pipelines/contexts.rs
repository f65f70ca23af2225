// app/src/pipelines/contexts.rs

//! Data structs the pipelines run over. Handlers receive them wrapped in
//! `sealcart_flow::ContextData`.

use crate::config::CheckoutSettings;
use crate::models::{CheckoutRequest, LineItem, Order, ProviderNotification};
use crate::money::Money;
use crate::services::alerts::AlertSink;
use crate::services::provider::{PaymentProvider, ProviderItem, ProviderOrder};
use crate::services::reconciler::ReconcileOutcome;
use crate::store::OrderStore;
use sealcart_flow::ContextData;
use std::sync::Arc;

#[derive(Clone)]
pub struct CheckoutDeps {
  pub store: OrderStore,
  pub provider: Arc<dyn PaymentProvider>,
  pub settings: Arc<CheckoutSettings>,
}

#[derive(Clone)]
pub struct ReconcileDeps {
  pub store: OrderStore,
  pub alerts: Arc<dyn AlertSink>,
}

pub struct CheckoutCtxData {
  pub deps: CheckoutDeps,
  pub request: CheckoutRequest,
  pub items: Vec<LineItem>,
  pub provider_items: Vec<ProviderItem>,
  pub total: Money,
  pub salt: Option<String>,
  pub digest: Option<String>,
  pub order: Option<Order>,
  pub approval: Option<ProviderOrder>,
}

impl CheckoutCtxData {
  pub fn new(deps: CheckoutDeps, request: CheckoutRequest) -> Self {
    Self {
      deps,
      request,
      items: Vec::new(),
      provider_items: Vec::new(),
      total: Money::ZERO,
      salt: None,
      digest: None,
      order: None,
      approval: None,
    }
  }
}

/// Main webhook context. `reconcile` is only populated for approval notifications.
pub struct WebhookCtxData {
  pub deps: ReconcileDeps,
  pub raw: Vec<u8>,
  pub notification: Option<ProviderNotification>,
  pub invoice: Option<String>,
  pub reconcile: Option<ContextData<ReconcileCtxData>>,
  pub outcome: Option<ReconcileOutcome>,
}

impl WebhookCtxData {
  pub fn new(deps: ReconcileDeps, raw: Vec<u8>) -> Self {
    Self {
      deps,
      raw,
      notification: None,
      invoice: None,
      reconcile: None,
      outcome: None,
    }
  }

  pub(crate) fn wants_reconciliation(&self) -> bool {
    self.outcome.is_none()
      && self.invoice.is_some()
      && self.notification.as_ref().is_some_and(ProviderNotification::is_approval)
  }
}

/// Scoped context for reconciling one invoice.
pub struct ReconcileCtxData {
  pub deps: ReconcileDeps,
  pub invoice: String,
  pub order: Option<Order>,
  pub recomputed_digest: Option<String>,
  pub outcome: Option<ReconcileOutcome>,
}

impl ReconcileCtxData {
  pub fn new(deps: ReconcileDeps, invoice: String) -> Self {
    Self {
      deps,
      invoice,
      order: None,
      recomputed_digest: None,
      outcome: None,
    }
  }
}
