use axum::response::Json;
use serde_json::json;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "dagex-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
