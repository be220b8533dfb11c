//! `storekeep-inventory` — seller-scoped stock records.

pub mod stock;

pub use stock::{InventoryRecord, StockReceipt};
