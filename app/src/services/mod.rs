// app/src/services/mod.rs
pub mod alerts;
pub mod checkout;
pub mod payment_mock;
pub mod provider;
pub mod reconciler;
