// app/src/pipelines/webhook_pipeline.rs

//! parse_notification -> route_notification -> acknowledge_notification
//!
//! Approval notifications are routed into the scoped reconcile pipeline:
//! load_order -> idempotency_guard -> recompute_digest -> verify_digest -> commit_verification.
//! Every guard that ends reconciliation early records an outcome and stops the
//! scoped run only; the parent still acknowledges.

use crate::errors::AppError;
use crate::models::ProviderNotification;
use crate::pipelines::contexts::{ReconcileCtxData, WebhookCtxData};
use crate::services::alerts::SecurityAlert;
use crate::services::reconciler::ReconcileOutcome;
use crate::store::LedgerWrite;
use sealcart_flow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const STEPS: &[(&str, bool)] = &[
  ("parse_notification", false),
  ("route_notification", false),
  ("acknowledge_notification", false),
];

pub const RECONCILE_STEPS: &[(&str, bool)] = &[
  ("load_order", false),
  ("idempotency_guard", false),
  ("recompute_digest", false),
  ("verify_digest", false),
  ("commit_verification", false),
];

pub fn reconcile_pipeline() -> Pipeline<ReconcileCtxData, AppError> {
  let mut p = Pipeline::<ReconcileCtxData, AppError>::new(RECONCILE_STEPS);
  p.on("load_order", load_order);
  p.on("idempotency_guard", idempotency_guard);
  p.on("recompute_digest", recompute_digest);
  p.on("verify_digest", verify_digest);
  p.on("commit_verification", commit_verification);
  p
}

pub fn webhook_pipeline() -> Pipeline<WebhookCtxData, AppError> {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(STEPS);
  p.on("parse_notification", parse_notification);

  p.conditional_scopes_for_step("route_notification")
    .add_scope(Arc::new(reconcile_pipeline()), |parent: ContextData<WebhookCtxData>| {
      let (deps, invoice) = {
        let guard = parent.read();
        (guard.deps.clone(), guard.invoice.clone())
      };
      let invoice = invoice.ok_or_else(|| FlowError::Internal("approval routed without an invoice".to_string()))?;
      let scoped = ContextData::new(ReconcileCtxData::new(deps, invoice));
      parent.write().reconcile = Some(scoped.clone());
      Ok(scoped)
    })
    .on_condition(|parent: ContextData<WebhookCtxData>| parent.read().wants_reconciliation())
    .on_scoped_stop(PipelineControl::Continue)
    .if_no_scope_matches(PipelineControl::Continue)
    .finalize_conditional_step(false);

  p.on("acknowledge_notification", acknowledge_notification);
  p
}

pub fn register_webhook_pipeline(registry: &FlowRegistry<AppError>) {
  registry.register_pipeline(webhook_pipeline());
}

// --- Main webhook steps ---

#[instrument(name = "webhook::parse_notification", skip_all)]
async fn parse_notification(ctx_data: ContextData<WebhookCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  match ProviderNotification::parse(&guard.raw) {
    Ok(notification) => {
      let invoice = notification.correlation_key().map(str::to_string);
      info!(
        event_type = notification.event_label(),
        approval = notification.is_approval(),
        invoice = ?invoice,
        "Webhook notification parsed."
      );
      guard.invoice = invoice;
      guard.notification = Some(notification);
    }
    Err(e) => {
      warn!(error = %e, bytes = guard.raw.len(), "Malformed webhook payload; acknowledging.");
      guard.outcome = Some(ReconcileOutcome::Malformed);
    }
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "webhook::acknowledge_notification", skip_all)]
async fn acknowledge_notification(ctx_data: ContextData<WebhookCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let outcome = match (&guard.outcome, &guard.reconcile, &guard.notification) {
    (Some(outcome), _, _) => outcome.clone(),
    (None, Some(scoped), _) => scoped
      .read()
      .outcome
      .clone()
      .ok_or_else(|| AppError::Internal("reconciliation finished without an outcome".to_string()))?,
    (None, None, Some(notification)) if !notification.is_approval() => ReconcileOutcome::Ignored {
      event_type: notification.event_label().to_string(),
    },
    (None, None, Some(_)) => ReconcileOutcome::MissingCorrelation,
    (None, None, None) => ReconcileOutcome::Malformed,
  };
  match &outcome {
    ReconcileOutcome::Ignored { event_type } => debug!(%event_type, "Irrelevant notification acknowledged."),
    ReconcileOutcome::MissingCorrelation => warn!("Approval without a correlation key; acknowledging."),
    other => info!(outcome = ?other, "Webhook acknowledged."),
  }
  guard.outcome = Some(outcome);
  Ok(PipelineControl::Continue)
}

// --- Reconcile steps ---

fn finish(ctx_data: &ContextData<ReconcileCtxData>, outcome: ReconcileOutcome) -> PipelineControl {
  ctx_data.write().outcome = Some(outcome);
  PipelineControl::Stop
}

/// Only the live (non-failed) order for the invoice is considered.
#[instrument(name = "reconcile::load_order", skip_all)]
async fn load_order(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let (store, invoice) = {
    let guard = ctx_data.read();
    (guard.deps.store.clone(), guard.invoice.clone())
  };

  match store.find_by_invoice(&invoice).await? {
    Some(order) => {
      debug!(order_id = order.id, status = %order.status, "Order loaded for reconciliation.");
      ctx_data.write().order = Some(order);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(%invoice, "Approval for an unknown invoice; acknowledging.");
      Ok(finish(&ctx_data, ReconcileOutcome::OrderNotFound { invoice }))
    }
  }
}

#[instrument(name = "reconcile::idempotency_guard", skip_all)]
async fn idempotency_guard(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let terminal = {
    let guard = ctx_data.read();
    guard
      .order
      .as_ref()
      .filter(|order| order.status.is_terminal())
      .map(|order| (order.invoice.clone(), order.status))
  };
  match terminal {
    Some((invoice, status)) => {
      info!(%invoice, %status, "Order already final; duplicate notification acknowledged.");
      Ok(finish(&ctx_data, ReconcileOutcome::AlreadyFinal { invoice, status }))
    }
    None => Ok(PipelineControl::Continue),
  }
}

/// Items, totals, salt and email all come from the stored order.
#[instrument(name = "reconcile::recompute_digest", skip_all)]
async fn recompute_digest(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let recomputed = guard
    .order
    .as_ref()
    .map(|order| order.commitment().digest())
    .ok_or_else(|| AppError::Internal("digest step reached without an order".to_string()))?;
  guard.recomputed_digest = Some(recomputed);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "reconcile::verify_digest", skip_all)]
async fn verify_digest(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let (alerts, mismatch) = {
    let guard = ctx_data.read();
    let (Some(order), Some(recomputed)) = (&guard.order, &guard.recomputed_digest) else {
      return Err(AppError::Internal("verification reached without a recomputed digest".to_string()));
    };
    let mismatch = (order.digest != *recomputed).then(|| SecurityAlert::DigestMismatch {
      order_id: order.id,
      invoice: order.invoice.clone(),
      stored_digest: order.digest.clone(),
      recomputed_digest: recomputed.clone(),
    });
    (guard.deps.alerts.clone(), mismatch)
  };

  let Some(alert) = mismatch else {
    debug!("Digest verified.");
    return Ok(PipelineControl::Continue);
  };
  let SecurityAlert::DigestMismatch { order_id, invoice, .. } = &alert;
  let outcome = ReconcileOutcome::Rejected {
    invoice: invoice.clone(),
    order_id: *order_id,
  };
  warn!(order_id, %invoice, "Digest mismatch; order left unchanged.");
  alerts.raise(alert.clone());
  Ok(finish(&ctx_data, outcome))
}

#[instrument(name = "reconcile::commit_verification", skip_all)]
async fn commit_verification(ctx_data: ContextData<ReconcileCtxData>) -> Result<PipelineControl, AppError> {
  let (store, order) = {
    let guard = ctx_data.read();
    (guard.deps.store.clone(), guard.order.clone())
  };
  let order = order.ok_or_else(|| AppError::Internal("commit reached without an order".to_string()))?;

  let outcome = match store.record_verification(&order).await? {
    LedgerWrite::Recorded(verified) => {
      info!(
        order_id = order.id,
        invoice = %order.invoice,
        verified_order_id = verified.id,
        total = %verified.total,
        "Order approved and recorded in the ledger."
      );
      ReconcileOutcome::Verified {
        invoice: order.invoice.clone(),
        order_id: order.id,
        verified_order_id: verified.id,
      }
    }
    LedgerWrite::AlreadyVerified => {
      info!(order_id = order.id, invoice = %order.invoice, "Concurrent delivery already verified this order.");
      ReconcileOutcome::DuplicateDelivery {
        invoice: order.invoice.clone(),
      }
    }
  };
  ctx_data.write().outcome = Some(outcome);
  Ok(PipelineControl::Continue)
}
