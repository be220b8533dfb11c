use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use storekeep_checkout::{place_order, OrderItemRequest, PlaceOrder};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

const CUSTOMER_LIST_LIMIT: i64 = 200;
const CUSTOMER_SEARCH_LIMIT: i64 = 50;
const PRODUCT_SEARCH_LIMIT: i64 = 100;

pub fn router() -> Router {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/search", get(search_customers))
        .route("/products", get(list_products))
        .route("/orders", post(create_order))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.list_customers(CUSTOMER_LIST_LIMIT).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn search_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let q = query.q.unwrap_or_default();
    match services
        .store
        .search_customers(&q, CUSTOMER_SEARCH_LIMIT)
        .await
    {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCustomerRequest>,
) -> axum::response::Response {
    let new_customer = body.into_new_customer();
    if let Err(e) = new_customer.validate() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    match services.store.create_customer(&new_customer).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Catalog search scoped to the caller's own stock levels.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let q = query.q.unwrap_or_default();
    match services
        .store
        .products_for_seller(user.id(), &q, PRODUCT_SEARCH_LIMIT)
        .await
    {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// The POS checkout call: the authenticated user is the fulfilling seller.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let request = PlaceOrder {
        customer_id: body.customer_id,
        seller_id: user.id(),
        items: body
            .items
            .into_iter()
            .map(|item| OrderItemRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    };

    match place_order(&services.store, &request).await {
        Ok(confirmation) => (
            StatusCode::CREATED,
            Json(dto::confirmation_to_json(confirmation)),
        )
            .into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
