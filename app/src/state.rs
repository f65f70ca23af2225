// app/src/state.rs
use crate::config::CheckoutSettings;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::alerts::AlertSink;
use crate::services::checkout::CheckoutOrchestrator;
use crate::services::provider::PaymentProvider;
use crate::services::reconciler::WebhookReconciler;
use crate::store::OrderStore;
use sealcart_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: OrderStore,
  pub registry: Arc<FlowRegistry<AppError>>,
  pub checkout: Arc<CheckoutOrchestrator>,
  pub reconciler: Arc<WebhookReconciler>,
}

impl AppState {
  pub fn new(
    store: OrderStore,
    provider: Arc<dyn PaymentProvider>,
    alerts: Arc<dyn AlertSink>,
    settings: CheckoutSettings,
  ) -> Self {
    let registry = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&registry);

    let checkout = CheckoutOrchestrator::new(registry.clone(), store.clone(), provider, settings);
    let reconciler = WebhookReconciler::new(registry.clone(), store.clone(), alerts);
    Self {
      store,
      registry,
      checkout: Arc::new(checkout),
      reconciler: Arc::new(reconciler),
    }
  }
}
