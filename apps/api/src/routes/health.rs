use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Public greeting, throttled per client.
pub async fn welcome_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to AI Resume Reviewer" }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-reviewer"
    }))
}
