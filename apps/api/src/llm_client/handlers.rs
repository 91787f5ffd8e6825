//! Axum route handlers for backend diagnostics.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::routes::form::MultipartForm;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckOllamaResponse {
    pub installed: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProviderTestResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GET /api/check-ollama
///
/// Reports whether the local server answers its model listing call.
pub async fn handle_check_ollama(State(state): State<AppState>) -> Json<CheckOllamaResponse> {
    let installed = state.dispatcher.local().is_running().await;
    Json(CheckOllamaResponse { installed })
}

/// POST /ai/test
///
/// Verifies a provider and credential with one authenticated listing call.
/// Failures are reported in the body, not as an error status.
pub async fn handle_provider_test(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProviderTestResponse>, AppError> {
    let form = MultipartForm::read(multipart).await?;
    Ok(Json(test_provider(&state, &form).await))
}

async fn test_provider(state: &AppState, form: &MultipartForm) -> ProviderTestResponse {
    let provider = form.optional("provider").unwrap_or_default();

    let result = match state.dispatcher.select(provider, form.optional("api_key")) {
        Ok(selection) => {
            let kind = selection.kind();
            state
                .dispatcher
                .client_for(selection)
                .verify()
                .await
                .map(|_| kind)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(kind) => {
            info!(provider = kind.as_str(), "Provider check passed");
            ProviderTestResponse {
                ok: true,
                message: None,
            }
        }
        Err(e) => {
            warn!(provider, "Provider check failed: {e}");
            ProviderTestResponse {
                ok: false,
                message: Some(e.to_string()),
            }
        }
    }
}
