pub mod form;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers as evaluation;
use crate::llm_client::handlers as llm;
use crate::state::AppState;

/// Resumes larger than this are rejected before extraction.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/ping", get(health::ping_handler))
        // Evaluation API
        .route("/analyze", post(evaluation::handle_analyze))
        // Backend diagnostics
        .route("/api/check-ollama", get(llm::handle_check_ollama))
        .route("/ai/test", post(llm::handle_provider_test))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
