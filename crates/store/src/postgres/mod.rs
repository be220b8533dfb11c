//! Postgres-backed store.
//!
//! ## Error mapping
//!
//! SQLx errors are mapped to [`StoreError`] as follows:
//!
//! | PostgreSQL error code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` | `Constraint` | Unique violation (e.g. duplicate e-mail) |
//! | `23503` | `Constraint` | Foreign key violation |
//! | `23514` | `Constraint` | Check violation (e.g. stock below zero) |
//! | `55P03` | `Contention` | Lock not available (NOWAIT / lock_timeout) |
//! | `40P01` | `Contention` | Deadlock broken by the server |
//! | other   | `Unavailable` | Pool closed, network failure, the rest |
//!
//! ## Thread safety
//!
//! [`PgStore`] is `Send + Sync`; all operations go through the SQLx pool,
//! which manages connections internally.

mod analytics;
mod checkout;
mod identity;
mod retail;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::instrument;

use storekeep_checkout::StoreError;

pub use checkout::PgCheckoutTx;

const SCHEMA: &str = include_str!("../schema.sql");

/// Postgres-backed implementation of every storekeep persistence surface.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small default pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the idempotent schema. Called once at startup.
    #[instrument(skip(self), err)]
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("init_schema", e))?;
        Ok(())
    }
}

/// Map SQLx errors to [`StoreError`] (table in the module docs).
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") | Some("23514") => StoreError::Constraint(msg),
                Some("55P03") | Some("40P01") => StoreError::Contention(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Integrity(format!("unexpected missing row in {operation}"))
        }
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

/// Decode a BIGINT amount column into the domain's unsigned cents.
pub(crate) fn decode_amount(operation: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Integrity(format!("negative amount in {operation}: {value}")))
}

/// Encode an unsigned cents amount for a BIGINT column.
pub(crate) fn encode_amount(operation: &str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Integrity(format!("amount out of range in {operation}: {value}")))
}
