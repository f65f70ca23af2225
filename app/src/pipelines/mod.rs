// app/src/pipelines/mod.rs

//! Pipeline definitions and their registration with the flow registry.

use crate::errors::AppError;
use sealcart_flow::FlowRegistry;

pub mod checkout_pipeline;
pub mod contexts;
pub mod webhook_pipeline;

/// Registers every application pipeline. Called once at startup.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering pipelines...");
  checkout_pipeline::register_checkout_pipeline(registry);
  webhook_pipeline::register_webhook_pipeline(registry);
  tracing::info!("All application pipelines registered.");
}
