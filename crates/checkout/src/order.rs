use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeep_core::{CustomerId, LineItemId, OrderId, ProductId, UserId};

/// Placed order header. Created exactly once per successful placement and
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Sum of line totals, in the smallest currency unit (e.g., cents).
    pub total_amount: u64,
    pub created_at: DateTime<Utc>,
}

/// One fulfilled line of an order.
///
/// `unit_price` is the price captured at placement time, not a live
/// reference to the product row; historical orders keep their prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub quantity: u64,
    /// Captured unit price in the smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Line item as handed to the store for insertion (id not yet assigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLineItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub quantity: u64,
    pub unit_price: u64,
}

/// One requested entry of a placement call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u64,
}

/// A placement request: who buys, which seller fulfills, what and how much.
///
/// Item order is significant: entries are processed exactly as given, and
/// duplicate products are checked sequentially, not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    pub seller_id: UserId,
    pub items: Vec<OrderItemRequest>,
}

/// What a successful placement returns to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    /// Total in the smallest currency unit (e.g., cents).
    pub total_amount: u64,
}
