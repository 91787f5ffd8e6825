//! Axum route handlers for the Evaluation API.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::evaluation::score::overall_score;
use crate::evaluation::ResumeInput;
use crate::extraction::{extract_text, DocumentKind, ExtractError};
use crate::llm_client::AnalyzeOutcome;
use crate::routes::form::{MultipartForm, UploadedFile};
use crate::state::AppState;

pub const LOCAL_UNAVAILABLE_MESSAGE: &str =
    "Ollama is not installed or not running. Please choose another AI provider.";

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalyzeResponse {
    Ok {
        provider: String,
        analysis: String,
        /// Read from the Overall Evaluation section; `None` when absent.
        score: Option<u8>,
    },
    Unavailable {
        provider: String,
        message: String,
    },
}

impl AnalyzeResponse {
    fn from_outcome(provider: &str, outcome: AnalyzeOutcome) -> Self {
        match outcome {
            AnalyzeOutcome::Evaluated(analysis) => AnalyzeResponse::Ok {
                provider: provider.to_string(),
                score: overall_score(&analysis),
                analysis,
            },
            AnalyzeOutcome::Unavailable => AnalyzeResponse::Unavailable {
                provider: provider.to_string(),
                message: LOCAL_UNAVAILABLE_MESSAGE.to_string(),
            },
        }
    }
}

/// POST /analyze
///
/// Multipart form: `job_title`, `sector`, `experience_level`, `provider`,
/// optional `api_key`, and the resume `file` (PDF or DOCX).
/// The provider and credential are validated before the upload is touched.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let provider = form.required("provider")?.to_string();
    let job_title = form.required("job_title")?.to_string();
    let sector = form.required("sector")?.to_string();
    let experience_level = form.required("experience_level")?.to_string();

    let selection = state
        .dispatcher
        .select(&provider, form.optional("api_key"))?;
    let upload = form.take_file()?;

    info!(
        provider = selection.kind().as_str(),
        file = %upload.file_name,
        "Analyzing resume"
    );

    let resume_text = extract_upload(upload).await?;
    let input = ResumeInput {
        resume_text,
        job_title,
        sector,
        experience_level,
    };

    let outcome = state.dispatcher.run(selection, &input).await?;
    Ok(Json(AnalyzeResponse::from_outcome(&provider, outcome)))
}

/// Stages the upload in a temporary file that keeps its extension, then
/// extracts its text. The file is removed when extraction finishes.
async fn extract_upload(upload: UploadedFile) -> Result<String, AppError> {
    let kind = DocumentKind::from_path(Path::new(&upload.file_name))?;

    let text = tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
        let mut staged = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile()?;
        staged.write_all(&upload.bytes)?;
        staged.flush()?;
        extract_text(staged.path())
    })
    .await
    .context("text extraction task failed")??;

    if text.trim().is_empty() {
        warn!("No text extracted from upload; the document may be scanned images");
    }
    Ok(text)
}
