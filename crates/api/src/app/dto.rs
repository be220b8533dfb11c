//! Request/response DTOs and JSON mapping helpers.

use serde::Deserialize;
use uuid::Uuid;

use storekeep_auth::{Role, UserProfile};
use storekeep_checkout::OrderConfirmation;
use storekeep_core::{CustomerId, ProductId};
use storekeep_customers::NewCustomer;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional role assertion; a mismatch is rejected.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Uuid,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub unique_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl CreateCustomerRequest {
    pub fn into_new_customer(self) -> NewCustomer {
        NewCustomer {
            unique_id: self.unique_id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            zip_code: self.zip_code,
            city: self.city,
            state: self.state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    /// Serde already rejects negatives; zero is rejected by the engine.
    pub quantity: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn auth_to_json(token: String, user: &UserProfile) -> serde_json::Value {
    serde_json::json!({
        "token": token,
        "user": user,
    })
}

pub fn confirmation_to_json(confirmation: OrderConfirmation) -> serde_json::Value {
    serde_json::json!({
        "order_id": confirmation.order_id,
        "total_amount": confirmation.total_amount,
    })
}
