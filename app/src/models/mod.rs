// app/src/models/mod.rs
pub mod checkout;
pub mod notification;
pub mod order;

pub use checkout::{CartItemRequest, CheckoutRequest, CheckoutResponse};
pub use notification::ProviderNotification;
pub use order::{LineItem, NewOrder, Order, OrderStatus, VerifiedOrder};
