//! `storekeep-store` — persistence backends.
//!
//! Two implementations of the transactional store seam the checkout engine
//! consumes (plus the boundary persistence the HTTP layer needs):
//!
//! - [`PgStore`]: Postgres via SQLx. Row locks are `SELECT ... FOR UPDATE`;
//!   every bulk operation runs in one transaction.
//! - [`InMemoryStore`]: tests/dev. Row locks are per-key async mutexes and
//!   writes are buffered until commit, preserving the same observable
//!   semantics.

pub mod analytics;
pub mod in_memory;
pub mod postgres;

pub use analytics::{
    CategoryRevenue, DailySales, Dashboard, DashboardKpis, RevenuePoint, EXPIRY_WINDOW_DAYS,
    LOW_STOCK_THRESHOLD,
};
pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
