// app/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{checkout_handlers, order_handlers, webhook_handlers};
use actix_web::web;

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
      web::QueryConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(order_handlers::health_handler))
    .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
    .route("/webhook", web::post().to(webhook_handlers::webhook_handler))
    .route("/admin/orders", web::get().to(order_handlers::list_orders_handler))
    .route("/orders/by-email", web::get().to(order_handlers::orders_by_email_handler));
}
