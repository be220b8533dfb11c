//! The transactional store seam consumed by the order placement engine.
//!
//! The engine is portable across storage backends that can provide
//! pessimistic per-row locking and atomic multi-statement commit/rollback;
//! everything it needs is expressed by the two traits below.

use async_trait::async_trait;
use thiserror::Error;

use storekeep_core::{CustomerId, OrderId, ProductId, UserId};

use crate::order::NewLineItem;

/// Failure inside the transactional store collaborator.
///
/// All variants roll the surrounding transaction back in full; none of them
/// is user-correctable, which is what separates them from
/// [`crate::CheckoutError::InsufficientStock`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lock wait timeout or a deadlock broken by the store.
    #[error("storage contention: {0}")]
    Contention(String),

    /// Unique/foreign-key/check constraint violation.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Referential state the engine relies on is missing or corrupt,
    /// e.g. an inventory row pointing at a product that does not exist.
    #[error("store integrity: {0}")]
    Integrity(String),

    /// Connectivity loss or any other backend failure.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Factory for transaction scopes.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    type Tx: CheckoutTransaction;

    /// Open a new transaction. Every transaction obtained here must be
    /// consumed by exactly one `commit` or `rollback` call.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One atomic unit of checkout work.
///
/// Row locks acquired through [`lock_inventory`](Self::lock_inventory) are
/// held until the transaction is committed or rolled back.
#[async_trait]
pub trait CheckoutTransaction: Send {
    /// Acquire an exclusive row lock on the inventory record for
    /// `(product_id, seller_id)` and return its committed stock, or `None`
    /// when no such record exists.
    ///
    /// Blocks while a concurrent transaction holds the same row; rows for
    /// other `(product, seller)` pairs are unaffected.
    async fn lock_inventory(
        &mut self,
        product_id: ProductId,
        seller_id: UserId,
    ) -> Result<Option<u64>, StoreError>;

    /// Canonical unit price of a product, in the smallest currency unit.
    ///
    /// A missing product row is an integrity failure: inventory rows
    /// reference products, so a locked row without a price means the store
    /// is corrupt.
    async fn product_price(&mut self, product_id: ProductId) -> Result<u64, StoreError>;

    /// Insert the order header and return its store-assigned id.
    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        total_amount: u64,
    ) -> Result<OrderId, StoreError>;

    /// Insert one line item referencing an order created in this transaction.
    async fn insert_line_item(&mut self, line: &NewLineItem) -> Result<(), StoreError>;

    /// Decrement the locked inventory row by `quantity`.
    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        seller_id: UserId,
        quantity: u64,
    ) -> Result<(), StoreError>;

    /// Make every write of this transaction durable, releasing all locks.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discard every write of this transaction, releasing all locks.
    async fn rollback(self) -> Result<(), StoreError>;
}
