use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /ping
pub async fn ping_handler() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// GET /health
/// Returns a simple status object with service version and the local model.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-review-api",
        "local_model": state.config.ollama_model
    }))
}
