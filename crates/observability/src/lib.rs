//! `storekeep-observability` — process-wide logging bootstrap.

pub mod tracing;

pub use tracing::init;
