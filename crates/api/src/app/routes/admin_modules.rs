//! Admin module lifecycle routes.
//!
//! Everything here delegates to the lifecycle engine; handlers only map
//! paths, extensions and errors.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use modulith_core::ModuleKey;

use crate::app::{errors, services::AppServices};
use crate::context::TenantContext;

pub fn router() -> Router {
    Router::new()
        .route("/admin/modules", get(list_modules))
        .route("/admin/modules/:key/install", post(install_module))
        .route("/admin/modules/:key/enable", post(enable_module))
        .route("/admin/modules/:key/disable", post(disable_module))
        .route("/admin/modules/:key/upgrade", post(upgrade_module))
        .route("/admin/modules/:key/seed/:seeder", post(seed_module))
}

/// GET /admin/modules - merged manifest + tenant state for every module.
pub async fn list_modules(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.engine.list(tenant.tenant_id()).await {
        Ok(statuses) => (StatusCode::OK, Json(statuses)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// POST /admin/modules/:key/install - idempotent.
pub async fn install_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = ModuleKey::from(key);
    match services.engine.install(tenant.tenant_id(), &key).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// POST /admin/modules/:key/enable - dependency-checked.
pub async fn enable_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = ModuleKey::from(key);
    match services.engine.enable(tenant.tenant_id(), &key).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// POST /admin/modules/:key/disable - idempotent; no cascade to dependents.
pub async fn disable_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = ModuleKey::from(key);
    match services.engine.disable(tenant.tenant_id(), &key).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// POST /admin/modules/:key/upgrade - triggers migrations when behind head.
pub async fn upgrade_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let key = ModuleKey::from(key);
    match services.engine.upgrade(tenant.tenant_id(), &key).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// POST /admin/modules/:key/seed/:seeder - requires installed + enabled.
pub async fn seed_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path((key, seeder)): Path<(String, String)>,
) -> axum::response::Response {
    let key = ModuleKey::from(key);
    match services.engine.seed(tenant.tenant_id(), &key, &seeder).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
