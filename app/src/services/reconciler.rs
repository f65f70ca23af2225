// app/src/services/reconciler.rs

use crate::errors::{AppError, Result};
use crate::models::OrderStatus;
use crate::pipelines::contexts::{ReconcileDeps, WebhookCtxData};
use crate::pipelines::webhook_pipeline::register_webhook_pipeline;
use crate::services::alerts::AlertSink;
use crate::store::OrderStore;
use sealcart_flow::{ContextData, FlowRegistry};
use std::sync::Arc;
use tracing::instrument;

/// What happened to one notification. Every variant is acknowledged to the
/// provider; only store failures (returned as errors) ask it to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
  Malformed,
  Ignored { event_type: String },
  MissingCorrelation,
  OrderNotFound { invoice: String },
  AlreadyFinal { invoice: String, status: OrderStatus },
  Verified { invoice: String, order_id: i64, verified_order_id: i64 },
  /// Digest mismatch: the stored order no longer matches its commitment.
  Rejected { invoice: String, order_id: i64 },
  DuplicateDelivery { invoice: String },
}

/// Transport-independent handler for provider notifications.
pub struct WebhookReconciler {
  registry: Arc<FlowRegistry<AppError>>,
  deps: ReconcileDeps,
}

impl WebhookReconciler {
  pub fn new(registry: Arc<FlowRegistry<AppError>>, store: OrderStore, alerts: Arc<dyn AlertSink>) -> Self {
    if !registry.is_registered::<WebhookCtxData>() {
      register_webhook_pipeline(&registry);
    }
    Self {
      registry,
      deps: ReconcileDeps { store, alerts },
    }
  }

  #[instrument(name = "WebhookReconciler::handle_notification", skip_all, fields(bytes = raw_payload.len()))]
  pub async fn handle_notification(&self, raw_payload: &[u8]) -> Result<ReconcileOutcome> {
    let ctx_data = ContextData::new(WebhookCtxData::new(self.deps.clone(), raw_payload.to_vec()));
    self.registry.run(ctx_data.clone()).await?;
    let outcome = ctx_data.read().outcome.clone();
    outcome.ok_or_else(|| AppError::Internal("webhook pipeline finished without an outcome".to_string()))
  }
}
