use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::TenantContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(tenant): Extension<TenantContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": tenant.tenant_id().as_str(),
    }))
}
