//! `storekeep-checkout` — the order placement engine.
//!
//! The one subsystem with a genuine consistency requirement: placing an
//! order must atomically validate and decrement per-seller stock while
//! creating the order and its line items, under concurrent access. The
//! engine is a pure orchestration function over the transactional store
//! seam in [`store`]; it holds no persistent state between calls.

pub mod engine;
pub mod error;
pub mod order;
pub mod store;

pub use engine::place_order;
pub use error::CheckoutError;
pub use order::{
    NewLineItem, Order, OrderConfirmation, OrderItemRequest, OrderLineItem, PlaceOrder,
};
pub use store::{CheckoutStore, CheckoutTransaction, StoreError};
