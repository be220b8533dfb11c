use thiserror::Error;

use storekeep_core::ProductId;

use crate::store::StoreError;

/// Order placement failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request carried no items. Rejected before any store interaction.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// A requested quantity was zero. Rejected before any store interaction.
    #[error("quantity must be a positive integer for product {product_id}")]
    NonPositiveQuantity { product_id: ProductId },

    /// A product's available stock cannot cover the requested quantity.
    /// User-correctable; the whole transaction has been rolled back.
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    /// The order total does not fit the supported amount range.
    #[error("order total overflows the supported amount for product {product_id}")]
    TotalOverflow { product_id: ProductId },

    /// Store/infrastructure failure; opaque to the end user.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Whether the caller can fix this by changing the request (as opposed
    /// to an internal fault). Boundary layers use this to pick a non-5xx
    /// status.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, CheckoutError::Store(_))
    }
}
