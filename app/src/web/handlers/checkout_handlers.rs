// app/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::CheckoutRequest;
use crate::state::AppState;

#[instrument(
  name = "handler::checkout",
  skip(app_state, payload),
  fields(invoice = %payload.invoice, lines = payload.cart_items.len())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let response = app_state.checkout.initiate_checkout(payload.into_inner()).await?;
  info!(order_id = response.order_id, "Checkout initiated.");
  Ok(HttpResponse::Ok().json(response))
}
