use std::sync::Arc;

use axum::Router;

use modulith_core::ModuleKey;

use crate::app::services::AppServices;
use crate::middleware::{self, GateState};

pub mod admin_modules;
pub mod inventory;
pub mod system;
pub mod wms;

/// Router for all tenant-scoped endpoints.
///
/// Business-module routers are opaque bundles; each is wrapped by the gate
/// layer keyed by its module so disabled modules vanish from the surface.
pub fn router(services: &Arc<AppServices>) -> Router {
    Router::new()
        .route("/whoami", axum::routing::get(system::whoami))
        .merge(admin_modules::router())
        .nest("/inventory", gated(services, "inventory", inventory::router()))
        .nest("/wms", gated(services, "wms", wms::router()))
}

fn gated(services: &Arc<AppServices>, module: &str, inner: Router) -> Router {
    let state = GateState {
        gate: services.gate.clone(),
        module: ModuleKey::from(module),
    };
    inner.layer(axum::middleware::from_fn_with_state(
        state,
        middleware::module_gate_middleware,
    ))
}
