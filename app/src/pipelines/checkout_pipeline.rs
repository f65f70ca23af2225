// app/src/pipelines/checkout_pipeline.rs

//! validate_cart -> price_cart -> seal_order -> persist_order -> create_provider_order

use crate::digest::{generate_salt, OrderCommitment};
use crate::errors::AppError;
use crate::models::checkout::GUEST_USERNAME;
use crate::models::{LineItem, NewOrder};
use crate::money::Money;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::provider::{ProviderItem, ProviderOrderRequest};
use sealcart_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

pub const STEPS: &[(&str, bool)] = &[
  ("validate_cart", false),
  ("price_cart", false),
  ("seal_order", false),
  ("persist_order", false),
  ("create_provider_order", false),
];

pub fn checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(STEPS);
  p.on("validate_cart", validate_cart);
  p.on("price_cart", price_cart);
  p.on("seal_order", seal_order);
  p.on("persist_order", persist_order);
  p.on("create_provider_order", create_provider_order);
  p.after("create_provider_order", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let guard = ctx_data.read();
    if let (Some(order), Some(approval)) = (&guard.order, &guard.approval) {
      info!(
        order_id = order.id,
        invoice = %order.invoice,
        provider_order_id = %approval.provider_order_id,
        "Checkout handed off to payment provider."
      );
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });
  p
}

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) {
  registry.register_pipeline(checkout_pipeline());
}

#[instrument(name = "checkout::validate_cart", skip_all)]
async fn validate_cart(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let request = ctx_data.read().request.clone();
  request.validate()?;
  // Webhook correlation trims references, so the stored invoice must already be trimmed.
  let invoice = request.invoice.trim();
  if invoice.is_empty() {
    return Err(AppError::Validation("invoice must not be blank".to_string()));
  }

  let mut items = Vec::with_capacity(request.cart_items.len());
  let mut provider_items = Vec::with_capacity(request.cart_items.len());
  for (idx, item) in request.cart_items.iter().enumerate() {
    let unit_price = item
      .price
      .to_money()
      .map_err(|e| AppError::Validation(format!("cart item {}: {}", idx, e)))?;
    if !unit_price.is_positive() {
      return Err(AppError::Validation(format!("cart item {}: price must be greater than zero", idx)));
    }
    let quantity = u32::try_from(item.quantity)
      .ok()
      .filter(|q| *q >= 1)
      .ok_or_else(|| AppError::Validation(format!("cart item {}: quantity must be at least 1", idx)))?;

    items.push(LineItem {
      product_id: item.id,
      quantity,
      unit_price,
    });
    provider_items.push(ProviderItem {
      sku: item.id,
      name: item
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Item {}", item.id)),
      quantity,
      unit_price,
    });
  }

  debug!(lines = items.len(), "Cart validated.");
  let mut guard = ctx_data.write();
  guard.request.invoice = invoice.to_string();
  guard.items = items;
  guard.provider_items = provider_items;
  Ok(PipelineControl::Continue)
}

/// Server-side total; whatever the client thinks the total is never gets here.
#[instrument(name = "checkout::price_cart", skip_all)]
async fn price_cart(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let total = guard
    .items
    .iter()
    .try_fold(Money::ZERO, |acc, item| {
      item.unit_price.checked_mul(item.quantity).and_then(|line| acc.checked_add(line))
    })
    .ok_or_else(|| AppError::Validation("cart total is out of range".to_string()))?;
  debug!(total = %total, "Cart priced.");
  guard.total = total;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::seal_order", skip_all)]
async fn seal_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let salt = generate_salt();
  let digest = OrderCommitment {
    currency: &guard.deps.settings.currency,
    merchant: &guard.request.email,
    salt: &salt,
    items: &guard.items,
    total: guard.total,
  }
  .digest();
  debug!(invoice = %guard.request.invoice, "Order sealed.");
  guard.salt = Some(salt);
  guard.digest = Some(digest);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::persist_order", skip_all)]
async fn persist_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (store, new_order) = {
    let guard = ctx_data.read();
    let (Some(salt), Some(digest)) = (guard.salt.clone(), guard.digest.clone()) else {
      return Err(AppError::Internal("order reached persistence unsealed".to_string()));
    };
    let username = guard
      .request
      .username
      .clone()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| GUEST_USERNAME.to_string());
    let new_order = NewOrder {
      invoice: guard.request.invoice.clone(),
      currency: guard.deps.settings.currency.clone(),
      email: guard.request.email.clone(),
      user_id: guard.request.user_id,
      username,
      salt,
      digest,
      total: guard.total,
      items: guard.items.clone(),
    };
    (guard.deps.store.clone(), new_order)
  };

  let order = store.insert_order(&new_order).await.map_err(|e| {
    error!(invoice = %new_order.invoice, error = %e, "Could not persist order; provider will not be called.");
    AppError::from(e)
  })?;
  info!(order_id = order.id, invoice = %order.invoice, total = %order.total, "Order persisted as pending.");
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

/// Failure or timeout here leaves the order pending; operators find it by invoice.
#[instrument(name = "checkout::create_provider_order", skip_all)]
async fn create_provider_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (provider, timeout, order_id, request) = {
    let guard = ctx_data.read();
    let order = guard
      .order
      .as_ref()
      .ok_or_else(|| AppError::Internal("provider step reached without a persisted order".to_string()))?;
    let settings = &guard.deps.settings;
    let request = ProviderOrderRequest {
      invoice: order.invoice.clone(),
      amount: order.total,
      currency: order.currency.clone(),
      items: guard.provider_items.clone(),
      return_url: settings.return_url.clone(),
      cancel_url: settings.cancel_url.clone(),
    };
    (guard.deps.provider.clone(), settings.provider_timeout, order.id, request)
  };

  let result = tokio::time::timeout(timeout, provider.create_order(&request)).await;
  let approval = match result {
    Ok(Ok(approval)) => approval,
    Ok(Err(e)) => {
      warn!(
        order_id,
        invoice = %request.invoice,
        provider = provider.name(),
        error = %e,
        "Provider order creation failed; order left pending."
      );
      return Err(e.into());
    }
    Err(_) => {
      warn!(
        order_id,
        invoice = %request.invoice,
        provider = provider.name(),
        timeout_ms = timeout.as_millis() as u64,
        "Provider order creation timed out; order left pending."
      );
      return Err(AppError::Provider(format!("provider did not answer within {:?}", timeout)));
    }
  };

  ctx_data.write().approval = Some(approval);
  Ok(PipelineControl::Continue)
}
