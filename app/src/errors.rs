// app/src/errors.rs

use crate::money::MoneyError;
use crate::services::provider::ProviderError;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sealcart_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Provider Error: {0}")]
  Provider(String),

  #[error("Order Store Unavailable: {0}")]
  StoreUnavailable(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::DuplicateInvoice(invoice) => {
        AppError::Conflict(format!("invoice '{}' already has a live order", invoice))
      }
      StoreError::Unavailable(e) => AppError::StoreUnavailable(e.to_string()),
      StoreError::Migration(e) => AppError::StoreUnavailable(e.to_string()),
      StoreError::Corrupt(msg) => AppError::Internal(format!("corrupt order data: {}", msg)),
    }
  }
}

impl From<ProviderError> for AppError {
  fn from(err: ProviderError) -> Self {
    AppError::Provider(err.to_string())
  }
}

impl From<MoneyError> for AppError {
  fn from(err: MoneyError) -> Self {
    AppError::Validation(err.to_string())
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(errs: validator::ValidationErrors) -> Self {
    AppError::Validation(errs.to_string())
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<StoreError>() {
      Ok(store_err) => store_err.into(),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl AppError {
  /// Only store outages are worth a retry from the caller.
  pub fn is_retryable(&self) -> bool {
    matches!(self, AppError::StoreUnavailable(_))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Provider(_) => StatusCode::BAD_GATEWAY,
      AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let body = match self {
      AppError::Validation(m) | AppError::Conflict(m) => json!({ "error": m }),
      AppError::Provider(_) => json!({ "error": "Payment provider unavailable; the order was kept pending." }),
      AppError::StoreUnavailable(_) => json!({ "error": "Order store unavailable; retry later." }),
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        json!({ "error": "An internal error occurred" })
      }
    };
    HttpResponse::build(self.status_code()).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
