//! Inventory module routes.
//!
//! Placeholder surface for the inventory bundle; the interesting part is
//! that the whole router sits behind the module gate.

use axum::{routing::get, Json, Router};
use serde_json::json;

pub fn router() -> Router {
    Router::new().route("/items", get(list_items))
}

async fn list_items() -> Json<serde_json::Value> {
    Json(json!({ "items": [] }))
}
