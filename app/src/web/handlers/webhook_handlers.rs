// app/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{error, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;

/// Always 200 once a decision is made, so the provider stops redelivering.
/// The verdict itself is never disclosed. Store outages answer 503 to get a retry.
#[instrument(name = "handler::webhook", skip_all, fields(bytes = body.len()))]
pub async fn webhook_handler(app_state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, AppError> {
  match app_state.reconciler.handle_notification(&body).await {
    Ok(_) => Ok(HttpResponse::Ok().json(json!({ "status": "accepted" }))),
    Err(e) if e.is_retryable() => {
      warn!(error = %e, "Order store unavailable; asking the provider to retry.");
      Err(e)
    }
    Err(e) => {
      error!(error = %e, "Webhook processing failed.");
      Err(e)
    }
  }
}
