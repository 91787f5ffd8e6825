//! OpenAI chat completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluation::prompt_builder::build_evaluation_prompt;
use crate::evaluation::prompts::OPENAI_FORMAT_INSTRUCTIONS;
use crate::evaluation::score::normalize_score_lines;
use crate::evaluation::ResumeInput;
use crate::llm_client::{
    api_error, endpoint, AnalyzeOutcome, ApiKey, LlmError, ProviderClient, ProviderKind,
};

/// Fast and cost efficient; enough for a single-resume evaluation.
pub const MODEL: &str = "gpt-4o-mini";
pub const MAX_RESUME_CHARS: usize = 4_000;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatCompletion {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl OpenAiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn analyze(&self, input: &ResumeInput) -> Result<AnalyzeOutcome, LlmError> {
        let prompt =
            build_evaluation_prompt(input, MAX_RESUME_CHARS, Some(OPENAI_FORMAT_INSTRUCTIONS));

        let request = ChatCompletionRequest {
            model: MODEL,
            messages: vec![Message {
                role: "user",
                content: &prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "/v1/chat/completions"))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let completion: ChatCompletion = response.json().await?;
        if let Some(usage) = &completion.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let text = completion.into_text().ok_or(LlmError::EmptyContent)?;
        Ok(AnalyzeOutcome::Evaluated(normalize_score_lines(&text)))
    }

    async fn verify(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "/v1/models"))
            .bearer_auth(self.api_key.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}
