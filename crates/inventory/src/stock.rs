use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult, ProductId, UserId};

/// Seller-scoped stock row, keyed by `(product_id, seller_id)`.
///
/// Invariant: `stock` never goes negative in committed state. Order
/// placement decrements under an exclusive row lock; uploads and restocks
/// increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub stock: u64,
    pub last_updated: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn can_fulfill(&self, quantity: u64) -> bool {
        self.stock >= quantity
    }

    /// Add received stock (upload/restock path).
    pub fn receive(&mut self, quantity: u64, now: DateTime<Utc>) {
        self.stock = self.stock.saturating_add(quantity);
        self.last_updated = now;
    }

    /// Remove fulfilled stock. Fails rather than going negative; callers
    /// are expected to have checked availability under the row lock.
    pub fn fulfill(&mut self, quantity: u64, now: DateTime<Utc>) -> DomainResult<()> {
        let remaining = self
            .stock
            .checked_sub(quantity)
            .ok_or_else(|| DomainError::conflict("stock would go negative"))?;
        self.stock = remaining;
        self.last_updated = now;
        Ok(())
    }
}

/// One received-stock entry from an inventory upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceipt {
    pub product_id: ProductId,
    pub quantity: u64,
}
