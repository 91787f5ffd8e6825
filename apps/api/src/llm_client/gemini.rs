//! Gemini `generateContent` backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::evaluation::prompt_builder::build_evaluation_prompt;
use crate::evaluation::score::normalize_score_lines;
use crate::evaluation::ResumeInput;
use crate::llm_client::{
    api_error, endpoint, AnalyzeOutcome, ApiKey, LlmError, ProviderClient, ProviderKind,
};

pub const MODEL: &str = "gemini-2.5-flash";
/// Large context window: the whole resume almost always fits.
pub const MAX_RESUME_CHARS: usize = 50_000;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl GeminiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn analyze(&self, input: &ResumeInput) -> Result<AnalyzeOutcome, LlmError> {
        let prompt = build_evaluation_prompt(input, MAX_RESUME_CHARS, None);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(endpoint(
                &self.base_url,
                &format!("/v1beta/models/{MODEL}:generateContent"),
            ))
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let generated: GenerateContentResponse = response.json().await?;
        let text = generated.into_text().ok_or(LlmError::EmptyContent)?;
        Ok(AnalyzeOutcome::Evaluated(normalize_score_lines(&text)))
    }

    async fn verify(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "/v1beta/models"))
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}
