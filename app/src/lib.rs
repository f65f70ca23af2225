// app/src/lib.rs

//! Order integrity and payment reconciliation.
//!
//! Checkout seals each order with a salted digest before handing the buyer to
//! the payment provider; webhook reconciliation re-derives that digest from
//! stored data and only then approves the order and appends it to the
//! verified-order ledger.

pub mod config;
pub mod digest;
pub mod errors;
pub mod models;
pub mod money;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use errors::{AppError, Result};
pub use state::AppState;
