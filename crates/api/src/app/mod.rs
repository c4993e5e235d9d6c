//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: settings, recipient store, rewriter and the merge session
//! - `routes/`: HTTP routes + handlers (one file per wizard area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Uploaded sheets are read whole; keep the cap generous.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &services::ApiSettings) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(settings).await?);
    Ok(router(services))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

pub use services::AppServices;
