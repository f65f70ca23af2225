// app/src/services/checkout.rs

use crate::config::CheckoutSettings;
use crate::errors::{AppError, Result};
use crate::models::{CheckoutRequest, CheckoutResponse};
use crate::pipelines::checkout_pipeline::register_checkout_pipeline;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutDeps};
use crate::services::provider::PaymentProvider;
use crate::store::OrderStore;
use sealcart_flow::{ContextData, FlowRegistry, PipelineResult};
use std::sync::Arc;
use tracing::instrument;

/// Turns a client cart into a sealed pending order and a provider approval URL.
pub struct CheckoutOrchestrator {
  registry: Arc<FlowRegistry<AppError>>,
  deps: CheckoutDeps,
}

impl CheckoutOrchestrator {
  pub fn new(
    registry: Arc<FlowRegistry<AppError>>,
    store: OrderStore,
    provider: Arc<dyn PaymentProvider>,
    settings: CheckoutSettings,
  ) -> Self {
    if !registry.is_registered::<CheckoutCtxData>() {
      register_checkout_pipeline(&registry);
    }
    Self {
      registry,
      deps: CheckoutDeps {
        store,
        provider,
        settings: Arc::new(settings),
      },
    }
  }

  #[instrument(name = "CheckoutOrchestrator::initiate_checkout", skip_all, fields(invoice = %request.invoice))]
  pub async fn initiate_checkout(&self, request: CheckoutRequest) -> Result<CheckoutResponse> {
    let ctx_data = ContextData::new(CheckoutCtxData::new(self.deps.clone(), request));

    if self.registry.run(ctx_data.clone()).await? == PipelineResult::Stopped {
      return Err(AppError::Internal("checkout pipeline stopped before completion".to_string()));
    }

    let guard = ctx_data.read();
    match (&guard.order, &guard.approval) {
      (Some(order), Some(approval)) => Ok(CheckoutResponse {
        approval_url: approval.approval_url.clone(),
        order_id: order.id,
        invoice: order.invoice.clone(),
      }),
      _ => Err(AppError::Internal("checkout completed without an approval handle".to_string())),
    }
  }
}
