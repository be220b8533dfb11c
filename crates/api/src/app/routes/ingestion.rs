//! CSV upload endpoints. Bodies are raw `text/csv`; each upload is decoded
//! by the ingestion crate and persisted in a single transaction.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use storekeep_ingestion::{
    parse_customers, parse_inventory, parse_products, parse_sales, IngestError, ParsedBatch,
};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

const PREVIEW_ROWS: usize = 10;

pub fn router() -> Router {
    Router::new()
        .route("/customers", post(ingest_customers))
        .route("/products", post(ingest_products))
        .route("/inventory", post(ingest_inventory))
        .route("/sales", post(ingest_sales))
}

fn decode_error_to_response(err: IngestError) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", err.to_string())
}

fn upload_response<T: Serialize>(
    batch: &ParsedBatch<T>,
    processed: usize,
) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "summary": batch.summary(processed),
            "preview": &batch.rows[..batch.rows.len().min(PREVIEW_ROWS)],
        })),
    )
        .into_response()
}

pub async fn ingest_customers(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let batch = match parse_customers(&body) {
        Ok(batch) => batch,
        Err(e) => return decode_error_to_response(e),
    };

    match services.store.import_customers(&batch.rows).await {
        Ok(processed) => upload_response(&batch, processed),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn ingest_products(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let batch = match parse_products(&body) {
        Ok(batch) => batch,
        Err(e) => return decode_error_to_response(e),
    };

    match services.store.import_products(&batch.rows).await {
        Ok(processed) => upload_response(&batch, processed),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn ingest_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> axum::response::Response {
    let batch = match parse_inventory(&body) {
        Ok(batch) => batch,
        Err(e) => return decode_error_to_response(e),
    };

    match services.store.receive_stock(user.id(), &batch.rows).await {
        Ok(processed) => upload_response(&batch, processed),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn ingest_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> axum::response::Response {
    let batch = match parse_sales(&body) {
        Ok(batch) => batch,
        Err(e) => return decode_error_to_response(e),
    };

    match services.store.import_sales(user.id(), &batch.rows).await {
        Ok(processed) => (
            StatusCode::OK,
            Json(serde_json::json!({ "summary": batch.summary(processed) })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
