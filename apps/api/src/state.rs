use crate::config::Config;
use crate::llm_client::dispatcher::Dispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the shared HTTP client and the local model's availability cache.
    pub dispatcher: Dispatcher,
}
