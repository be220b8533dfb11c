use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use storekeep_core::{CategoryId, DomainError, DomainResult, ProductId};

/// Product category. Resolved-or-created by name during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Name assigned to products whose upload row carries no category.
pub const DEFAULT_CATEGORY: &str = "General";

/// Catalog entry. Immutable for pricing purposes: checkout always reads
/// `price` from this record, never from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Canonical unit price in the smallest currency unit (e.g., cents).
    pub price: u64,
    pub expiry_date: Option<NaiveDate>,
    pub category_id: CategoryId,
}

impl Product {
    /// Whether the product is expired, or expires within `days` of `today`.
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        match self.expiry_date {
            Some(date) => date <= today + chrono::Duration::days(days),
            None => false,
        }
    }
}

/// Input for creating a product; the category is referenced by name and
/// resolved (or created) by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    /// Price in the smallest currency unit (e.g., cents).
    pub price: u64,
    pub expiry_date: Option<NaiveDate>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name must not be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category name must not be empty"));
        }
        Ok(())
    }
}

/// Seller-facing product listing row: catalog data joined with the
/// requesting seller's own stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub id: ProductId,
    pub name: String,
    /// Canonical unit price in the smallest currency unit (e.g., cents).
    pub price: u64,
    pub expiry_date: Option<NaiveDate>,
    pub category_name: String,
    /// The requesting seller's stock; zero when the seller holds none.
    pub stock: u64,
}
