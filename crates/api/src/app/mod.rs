//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (database, token codec, config knobs)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    let auth_state = middleware::AuthState {
        services: Arc::clone(&services),
    };

    // Public: health plus the credential endpoints that mint tokens.
    let public = Router::new()
        .route("/api/health", get(routes::system::health))
        .nest("/api/auth", routes::auth::public_router());

    // Everything else requires a valid bearer token.
    let protected = Router::new()
        .nest("/api", routes::protected_router())
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .merge(public)
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new()))
}
