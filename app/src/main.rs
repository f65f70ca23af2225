// app/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use sealcart::config::{AppConfig, ProviderKind};
use sealcart::services::alerts::TracingAlertSink;
use sealcart::services::payment_mock::MockPaymentProvider;
use sealcart::services::provider::{PayPalProvider, PaymentProvider};
use sealcart::store::OrderStore;
use sealcart::web::routes::configure_app_routes;
use sealcart::AppState;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting sealcart server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let store = match OrderStore::connect(&app_config.database_url).await {
    Ok(store) => store,
    Err(e) => {
      tracing::error!(error = %e, "Failed to open the order store.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let provider: Arc<dyn PaymentProvider> = match (&app_config.provider, &app_config.paypal) {
    (ProviderKind::PayPal, Some(credentials)) => Arc::new(PayPalProvider::new(credentials.clone())),
    _ => {
      tracing::warn!("Using the mock payment provider; approval URLs are not real.");
      Arc::new(MockPaymentProvider::default())
    }
  };
  tracing::info!(provider = provider.name(), "Payment provider selected.");

  let app_state = AppState::new(
    store,
    provider,
    Arc::new(TracingAlertSink),
    app_config.checkout.clone(),
  );

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
