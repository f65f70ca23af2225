// app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};
use validator::ValidateEmail;

use crate::errors::AppError;
use crate::state::AppState;

const RECENT_ORDERS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
  pub email: Option<String>,
}

#[instrument(name = "handler::list_orders", skip_all)]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.list_orders().await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::orders_by_email", skip_all)]
pub async fn orders_by_email_handler(
  app_state: web::Data<AppState>,
  query: web::Query<EmailQuery>,
) -> Result<HttpResponse, AppError> {
  let email = query
    .into_inner()
    .email
    .map(|e| e.trim().to_string())
    .filter(|e| !e.is_empty())
    .ok_or_else(|| AppError::Validation("email query parameter is required".to_string()))?;
  if !email.validate_email() {
    return Err(AppError::Validation("email is not a valid address".to_string()));
  }

  let orders = app_state.store.recent_orders_by_email(&email, RECENT_ORDERS_LIMIT).await?;
  Ok(HttpResponse::Ok().json(orders))
}

pub async fn health_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match app_state.store.ping().await {
    Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok", "store": "ok" })),
    Err(e) => {
      warn!(error = %e, "Health check could not reach the order store.");
      HttpResponse::ServiceUnavailable().json(json!({ "status": "degraded", "store": "unavailable" }))
    }
  }
}
