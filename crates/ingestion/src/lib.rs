//! `storekeep-ingestion` — CSV bulk-upload decoding.
//!
//! Pure decoding and row cleaning: bytes in, typed rows plus
//! processed/rejected counts out. Uploads accept canonical column names
//! only; persistence happens behind the store layer.

pub mod batch;
pub mod customers;
pub mod inventory;
pub mod products;
pub mod sales;

pub use batch::{IngestError, ParsedBatch, UploadSummary};
pub use customers::parse_customers;
pub use inventory::parse_inventory;
pub use products::{parse_price_cents, parse_products};
pub use sales::{parse_sales, HistoricalLine, HistoricalOrder};
