//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (state store, runners, engine, gate)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use modulith_catalog::ManifestCatalog;

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(catalog: Arc<ManifestCatalog>) -> Router {
    let services = Arc::new(services::build_services(catalog).await);

    // Tenant-scoped routes: resolve tenant from header (or default).
    let tenant_scoped = routes::router(&services)
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn(middleware::tenant_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(tenant_scoped)
        .layer(ServiceBuilder::new())
}
