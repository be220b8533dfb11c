use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storekeep_checkout::{CheckoutError, StoreError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Placement failures: validation problems are the client's to fix,
/// insufficient stock is a conflict, store faults stay opaque.
pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::EmptyOrder
        | CheckoutError::NonPositiveQuantity { .. }
        | CheckoutError::TotalOverflow { .. } => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        CheckoutError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        CheckoutError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        // Constraint violations reach here when a write races a duplicate
        // or references a missing row; the request, not the server, is at
        // fault.
        StoreError::Constraint(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Contention(_) | StoreError::Integrity(_) | StoreError::Unavailable(_) => {
            tracing::error!(error = %err, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage failure",
            )
        }
    }
}
