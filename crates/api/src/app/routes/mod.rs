use axum::Router;

pub mod analytics;
pub mod auth;
pub mod checkout;
pub mod ingestion;
pub mod system;

/// Router for all authenticated endpoints.
pub fn protected_router() -> Router {
    Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/checkout", checkout::router())
        .nest("/ingestion", ingestion::router())
        .nest("/analytics", analytics::router())
}
