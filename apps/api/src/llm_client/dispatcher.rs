//! Routes an evaluation to the selected backend.
//!
//! Pure routing: no retries and no result caching. Provider ids and
//! credentials are validated before any client exists, so a rejected request
//! never touches the network.

use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::evaluation::ResumeInput;
use crate::llm_client::availability::ModelAvailability;
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::ollama::OllamaClient;
use crate::llm_client::openai::OpenAiClient;
use crate::llm_client::{
    AnalyzeOutcome, ApiKey, HttpClients, LlmError, ProviderClient, ProviderKind,
    ProviderSelection,
};

#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    local: Arc<OllamaClient>,
    openai_base_url: String,
    gemini_base_url: String,
    openai_fallback_key: Option<ApiKey>,
    gemini_fallback_key: Option<ApiKey>,
}

impl Dispatcher {
    pub fn new(http: HttpClients, config: &Config, availability: Arc<dyn ModelAvailability>) -> Self {
        let local = OllamaClient::new(
            http.clone(),
            config.ollama_host.clone(),
            config.ollama_model.clone(),
            availability,
        );

        Self {
            client: http.api,
            local: Arc::new(local),
            openai_base_url: config.openai_base_url.clone(),
            gemini_base_url: config.gemini_base_url.clone(),
            openai_fallback_key: config.openai_api_key.clone().and_then(ApiKey::new),
            gemini_fallback_key: config.gemini_api_key.clone().and_then(ApiKey::new),
        }
    }

    pub fn local(&self) -> &OllamaClient {
        &self.local
    }

    /// Parses the provider id and resolves its credential: the request's key
    /// when it is non-blank, otherwise the server-side fallback key.
    pub fn select(
        &self,
        provider_id: &str,
        credential: Option<&str>,
    ) -> Result<ProviderSelection, LlmError> {
        let kind: ProviderKind = provider_id.parse()?;
        let api_key = credential
            .and_then(ApiKey::new)
            .or_else(|| self.fallback_key(kind));
        ProviderSelection::new(kind, api_key)
    }

    fn fallback_key(&self, kind: ProviderKind) -> Option<ApiKey> {
        match kind {
            ProviderKind::Local => None,
            ProviderKind::OpenAi => self.openai_fallback_key.clone(),
            ProviderKind::Gemini => self.gemini_fallback_key.clone(),
        }
    }

    /// The client for a validated selection.
    pub fn client_for(&self, selection: ProviderSelection) -> Arc<dyn ProviderClient> {
        match selection {
            ProviderSelection::Local => self.local.clone(),
            ProviderSelection::OpenAi(key) => Arc::new(OpenAiClient::new(
                self.client.clone(),
                self.openai_base_url.clone(),
                key,
            )),
            ProviderSelection::Gemini(key) => Arc::new(GeminiClient::new(
                self.client.clone(),
                self.gemini_base_url.clone(),
                key,
            )),
        }
    }

    /// Runs one evaluation on an already validated selection.
    /// The client's result is returned untouched.
    pub(crate) async fn run(
        &self,
        selection: ProviderSelection,
        input: &ResumeInput,
    ) -> Result<AnalyzeOutcome, LlmError> {
        let provider = selection.kind();
        info!(provider = provider.as_str(), "Dispatching resume evaluation");
        self.client_for(selection).analyze(input).await
    }

    /// `select` followed by `run`. The analyze handler splits the two so the
    /// upload is only read once the selection is valid.
    #[allow(dead_code)]
    pub async fn dispatch(
        &self,
        provider_id: &str,
        credential: Option<&str>,
        input: &ResumeInput,
    ) -> Result<AnalyzeOutcome, LlmError> {
        let selection = self.select(provider_id, credential)?;
        self.run(selection, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::availability::ModelAvailabilityCache;
    use crate::llm_client::test_support::{clients, sample_input, spawn_backend, Hits, UNREACHABLE};
    use axum::{Json, Router};
    use serde_json::json;

    /// A backend that answers every path as OpenAI would and counts requests.
    async fn counting_backend(hits: Hits) -> String {
        let router = Router::new().fallback(move || {
            let hits = hits.clone();
            async move {
                hits.record();
                Json(json!({
                    "choices": [{ "message": { "content": "Overall Score: 88/100" } }]
                }))
            }
        });
        spawn_backend(router).await
    }

    fn dispatcher(base: &str, config: Config) -> Dispatcher {
        let config = Config {
            ollama_host: base.to_string(),
            openai_base_url: base.to_string(),
            gemini_base_url: base.to_string(),
            ..config
        };
        Dispatcher::new(clients(), &config, Arc::new(ModelAvailabilityCache::new()))
    }

    #[tokio::test]
    async fn test_unknown_provider_makes_no_calls() {
        let hits = Hits::default();
        let base = counting_backend(hits.clone()).await;
        let dispatcher = dispatcher(&base, Config::default());

        let err = dispatcher
            .dispatch("anthropic", Some("key"), &sample_input("cv"))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::UnknownProvider(ref id) if id == "anthropic"));
        assert_eq!(hits.count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let hits = Hits::default();
        let base = counting_backend(hits.clone()).await;
        let dispatcher = dispatcher(&base, Config::default());

        for provider in ["openai", "hosted_b"] {
            let err = dispatcher
                .dispatch(provider, Some("  "), &sample_input("cv"))
                .await
                .unwrap_err();
            assert!(matches!(err, LlmError::MissingCredential(_)), "{provider}");
        }
        let err = dispatcher
            .dispatch("gemini", None, &sample_input("cv"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Gemini API key missing.");
        assert_eq!(hits.count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_key_from_config() {
        let hits = Hits::default();
        let base = counting_backend(hits.clone()).await;
        let config = Config {
            openai_api_key: Some("sk-server".to_string()),
            ..Config::default()
        };
        let dispatcher = dispatcher(&base, config);

        let selection = dispatcher.select("openai", None).unwrap();
        assert_eq!(selection, ProviderSelection::OpenAi(ApiKey::new("sk-server").unwrap()));

        let selection = dispatcher.select("openai", Some("sk-user")).unwrap();
        assert_eq!(selection, ProviderSelection::OpenAi(ApiKey::new("sk-user").unwrap()));

        let outcome = dispatcher
            .dispatch("openai", None, &sample_input("cv"))
            .await
            .unwrap();
        assert_eq!(outcome, AnalyzeOutcome::Evaluated("Score: 88/100".to_string()));
        assert_eq!(hits.count(), 1);
    }

    #[tokio::test]
    async fn test_run_takes_a_validated_selection() {
        let hits = Hits::default();
        let base = counting_backend(hits.clone()).await;
        let dispatcher = dispatcher(&base, Config::default());

        let selection = dispatcher.select("hosted_a", Some("sk-user")).unwrap();
        assert_eq!(hits.count(), 0);

        let outcome = dispatcher.run(selection, &sample_input("cv")).await.unwrap();
        assert_eq!(outcome, AnalyzeOutcome::Evaluated("Score: 88/100".to_string()));
        assert_eq!(hits.count(), 1);
    }

    #[tokio::test]
    async fn test_local_ignores_credential_and_reports_unavailable() {
        let dispatcher = dispatcher(UNREACHABLE, Config::default());

        let outcome = dispatcher
            .dispatch("local", Some("sk-ignored"), &sample_input("cv"))
            .await
            .unwrap();

        assert_eq!(outcome, AnalyzeOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_hosted_failure_is_an_error_not_unavailable() {
        let dispatcher = dispatcher(UNREACHABLE, Config::default());

        let result = dispatcher
            .dispatch("gemini", Some("g-key"), &sample_input("cv"))
            .await;

        assert!(matches!(result, Err(LlmError::Http(_))));
    }

    #[test]
    fn test_client_for_matches_selection() {
        let dispatcher = dispatcher(UNREACHABLE, Config::default());
        let key = ApiKey::new("k").unwrap();

        assert_eq!(
            dispatcher.client_for(ProviderSelection::Local).kind(),
            ProviderKind::Local
        );
        assert_eq!(
            dispatcher.client_for(ProviderSelection::OpenAi(key.clone())).kind(),
            ProviderKind::OpenAi
        );
        assert_eq!(
            dispatcher.client_for(ProviderSelection::Gemini(key)).kind(),
            ProviderKind::Gemini
        );
    }
}
