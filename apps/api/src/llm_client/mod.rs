//! LLM Client — every backend call made by the evaluator goes through here.
//!
//! Three backends sit behind the one `ProviderClient` contract: a local Ollama
//! server, OpenAI, and Gemini. Each client renders its own prompt, makes exactly
//! one generation call, and normalizes the score line before returning.
//!
//! No call is retried. The local backend reports absence through
//! `AnalyzeOutcome::Unavailable`; hosted failures propagate as `LlmError`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::evaluation::ResumeInput;

pub mod availability;
pub mod dispatcher;
pub mod gemini;
pub mod handlers;
pub mod ollama;
pub mod openai;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} API key missing.")]
    MissingCredential(ProviderKind),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model pull failed: {0}")]
    Pull(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Result of one analyze call that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// Normalized evaluation text.
    Evaluated(String),
    /// The local backend is not usable; the caller should offer another provider.
    Unavailable,
}

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Local,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Local => "Ollama",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(ProviderKind::Local),
            "hosted_a" | "openai" => Ok(ProviderKind::OpenAi),
            "hosted_b" | "gemini" => Ok(ProviderKind::Gemini),
            _ => Err(LlmError::UnknownProvider(s.to_string())),
        }
    }
}

/// A non-blank API key. The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| ApiKey(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// A validated provider choice. Hosted variants cannot exist without a key,
/// so a constructed selection is always callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    Local,
    OpenAi(ApiKey),
    Gemini(ApiKey),
}

impl ProviderSelection {
    /// Builds a selection from a kind and an optional key.
    /// Keys passed for `Local` are ignored.
    pub fn new(kind: ProviderKind, api_key: Option<ApiKey>) -> Result<Self, LlmError> {
        match (kind, api_key) {
            (ProviderKind::Local, _) => Ok(ProviderSelection::Local),
            (ProviderKind::OpenAi, Some(key)) => Ok(ProviderSelection::OpenAi(key)),
            (ProviderKind::Gemini, Some(key)) => Ok(ProviderSelection::Gemini(key)),
            (kind, None) => Err(LlmError::MissingCredential(kind)),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderSelection::Local => ProviderKind::Local,
            ProviderSelection::OpenAi(_) => ProviderKind::OpenAi,
            ProviderSelection::Gemini(_) => ProviderKind::Gemini,
        }
    }
}

/// The uniform backend contract.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Evaluates the resume. Returned text has already been score-normalized.
    async fn analyze(&self, input: &ResumeInput) -> Result<AnalyzeOutcome, LlmError>;

    /// Cheap authenticated call proving the backend is reachable.
    async fn verify(&self) -> Result<(), LlmError>;
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The reqwest clients shared by every provider.
#[derive(Clone)]
pub struct HttpClients {
    /// Generation and listing calls, bounded by the configured total timeout.
    pub api: Client,
    /// Model pulls. Only connecting is bounded: a multi-gigabyte pull streams
    /// for as long as it needs.
    pub download: Client,
}

impl HttpClients {
    pub fn new(request_timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            api: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(request_timeout)
                .build()?,
            download: Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?,
        })
    }
}

/// Provider error bodies: `{"error": {"message": ".."}}` (OpenAI, Gemini)
/// or `{"error": ".."}` (Ollama).
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

/// Converts a non-success response into `LlmError::Api`, preferring the
/// provider's own error message over the raw body.
pub(crate) async fn api_error(response: Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LlmError::Api {
        status,
        message: extract_error_message(body),
    }
}

fn extract_error_message(body: String) -> String {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { message },
        })
        | Ok(ErrorEnvelope {
            error: ErrorBody::Plain(message),
        }) => message,
        Err(_) => body,
    }
}

/// Joins a configured base URL and an API path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
