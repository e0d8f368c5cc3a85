//! Request middleware: tenant resolution and module gating.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use modulith_core::{ModuleKey, TenantId};
use modulith_lifecycle::ModuleGate;

use crate::app::errors;
use crate::context::TenantContext;

/// Header carrying the tenant identifier. Absent means the single well-known
/// default tenant (standalone deployments).
pub const TENANT_HEADER: &str = "x-tenant-id";

pub async fn tenant_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let tenant_id = match resolve_tenant(req.headers()) {
        Ok(t) => t,
        Err(response) => return response,
    };

    req.extensions_mut().insert(TenantContext::new(tenant_id));
    next.run(req).await
}

fn resolve_tenant(headers: &HeaderMap) -> Result<TenantId, Response> {
    let Some(header) = headers.get(TENANT_HEADER) else {
        return Ok(TenantId::default_tenant());
    };

    let header = header.to_str().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_tenant",
            "tenant header is not valid UTF-8",
        )
    })?;

    header.parse::<TenantId>().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_tenant",
            "tenant header cannot be blank",
        )
    })
}

/// State for the per-module gate layer.
#[derive(Clone)]
pub struct GateState {
    pub gate: ModuleGate,
    pub module: ModuleKey,
}

/// Rejects requests for modules the tenant has not enabled.
///
/// A disabled module's routes answer exactly like nonexistent ones (bare 404,
/// empty body) so tenants cannot probe for modules they cannot see.
pub async fn module_gate_middleware(
    State(state): State<GateState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(tenant) = req.extensions().get::<TenantContext>().cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.gate.is_enabled(tenant.tenant_id(), &state.module).await {
        Ok(true) => next.run(req).await,
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
    }
}
