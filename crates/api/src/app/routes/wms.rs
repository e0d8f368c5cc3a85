//! Warehouse module routes.
//!
//! Placeholder surface for the wms bundle, gated like inventory.

use axum::{routing::get, Json, Router};
use serde_json::json;

pub fn router() -> Router {
    Router::new().route("/locations", get(list_locations))
}

async fn list_locations() -> Json<serde_json::Value> {
    Json(json!({ "locations": [] }))
}
