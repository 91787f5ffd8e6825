//! Local backend: an Ollama server.
//!
//! Ollama being absent is a normal operating condition, so every failure on
//! the call path is reported as `AnalyzeOutcome::Unavailable` instead of an
//! error. Before the first call for a model the client makes sure the model
//! is installed, pulling it if needed; that bootstrap runs once per process.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::evaluation::prompt_builder::build_evaluation_prompt;
use crate::evaluation::score::normalize_score_lines;
use crate::evaluation::ResumeInput;
use crate::llm_client::availability::ModelAvailability;
use crate::llm_client::{
    api_error, endpoint, AnalyzeOutcome, HttpClients, LlmError, ProviderClient, ProviderKind,
};

/// The local model has a 4k context window.
pub const MAX_RESUME_CHARS: usize = 4_000;

const NUM_CTX: u32 = 4096;
const NUM_PREDICT: u32 = 2500;
const TEMPERATURE: f32 = 0.3;
const NUM_THREAD: u32 = 4;
const REPEAT_PENALTY: f32 = 1.1;

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Debug, Deserialize)]
struct InstalledModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

/// One NDJSON line of a streaming pull.
#[derive(Debug, Deserialize)]
struct PullStatus {
    status: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    num_ctx: u32,
    num_predict: u32,
    temperature: f32,
    num_thread: u32,
    repeat_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    download: Client,
    host: String,
    model: String,
    availability: Arc<dyn ModelAvailability>,
}

impl OllamaClient {
    pub fn new(
        http: HttpClients,
        host: impl Into<String>,
        model: impl Into<String>,
        availability: Arc<dyn ModelAvailability>,
    ) -> Self {
        Self {
            client: http.api,
            download: http.download,
            host: host.into(),
            model: model.into(),
            availability,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(endpoint(&self.host, "/api/tags"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// True when the server answers the inventory call.
    pub async fn is_running(&self) -> bool {
        self.list_models().await.is_ok()
    }

    /// Makes sure the configured model is installed, once per process.
    ///
    /// Only a transport failure on the inventory call is returned: the server
    /// is not there and nothing was checked. Any other problem is logged and
    /// the model is still marked checked so later requests do not repeat it.
    async fn ensure_model(&self) -> Result<(), LlmError> {
        if self.availability.is_checked(&self.model) {
            return Ok(());
        }

        match self.list_models().await {
            Ok(installed) if model_is_installed(&installed, &self.model) => {
                debug!(model = %self.model, "Model already installed");
            }
            Ok(_) => {
                info!(model = %self.model, "Model not found locally, pulling (this can take a while)");
                match self.pull_model().await {
                    Ok(()) => info!(model = %self.model, "Model pulled successfully"),
                    Err(e) => warn!(model = %self.model, "Model pull failed: {e}"),
                }
            }
            Err(e @ LlmError::Http(_)) => return Err(e),
            Err(e) => warn!(model = %self.model, "Model inventory check failed: {e}"),
        }

        self.availability.mark_checked(&self.model);
        Ok(())
    }

    /// Streams a pull, logging each new status line. Runs on the download
    /// client, which has no total timeout.
    async fn pull_model(&self) -> Result<(), LlmError> {
        let response = self
            .download
            .post(endpoint(&self.host, "/api/pull"))
            .json(&PullRequest {
                model: &self.model,
                stream: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut last_status = String::new();

        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                handle_pull_line(&line, &mut last_status)?;
            }
        }
        handle_pull_line(&buffer, &mut last_status)
    }

    async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                num_ctx: NUM_CTX,
                num_predict: NUM_PREDICT,
                temperature: TEMPERATURE,
                num_thread: NUM_THREAD,
                repeat_penalty: REPEAT_PENALTY,
            },
        };

        let response = self
            .client
            .post(endpoint(&self.host, "/api/chat"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let chat: ChatResponse = response.json().await?;
        if chat.message.content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(chat.message.content)
    }
}

#[async_trait]
impl ProviderClient for OllamaClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn analyze(&self, input: &ResumeInput) -> Result<AnalyzeOutcome, LlmError> {
        let prompt = build_evaluation_prompt(input, MAX_RESUME_CHARS, None);

        if let Err(e) = self.ensure_model().await {
            warn!(host = %self.host, "Ollama is not reachable: {e}");
            return Ok(AnalyzeOutcome::Unavailable);
        }

        match self.chat(&prompt).await {
            Ok(text) => Ok(AnalyzeOutcome::Evaluated(normalize_score_lines(&text))),
            Err(e) => {
                warn!(host = %self.host, model = %self.model, "Ollama chat failed: {e}");
                Ok(AnalyzeOutcome::Unavailable)
            }
        }
    }

    async fn verify(&self) -> Result<(), LlmError> {
        self.list_models().await.map(|_| ())
    }
}

/// An installed name matches when it contains the target id or shares its
/// family (the part before `:`), so `qwen2.5:14b` accepts `qwen2.5:14b-instruct`
/// and `qwen2.5:latest`.
fn model_is_installed(installed: &[String], target: &str) -> bool {
    let family = target.split(':').next().unwrap_or(target);
    installed
        .iter()
        .any(|name| name.contains(target) || name.starts_with(family))
}

fn handle_pull_line(line: &[u8], last_status: &mut String) -> Result<(), LlmError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    let Ok(status) = serde_json::from_str::<PullStatus>(line) else {
        debug!("Skipping unparseable pull line: {line}");
        return Ok(());
    };

    if let Some(error) = status.error {
        return Err(LlmError::Pull(error));
    }
    if let Some(status) = status.status {
        if status != *last_status {
            info!("  {status}");
            *last_status = status;
        }
    }
    Ok(())
}
