use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contextor::Providers;
use rag_store::RagStore;

use crate::core::{
    app_config::{AppConfig, ConfigError},
    session::SessionStore,
};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AppConfig>,
    pub store: RagStore,
    pub providers: Providers,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wires the store, the LLM-backed providers and an empty session table.
    pub fn new(cfg: AppConfig) -> Result<Self, ConfigError> {
        let svc = Arc::new(LlmServiceProfiles::new(
            cfg.generation.clone(),
            cfg.embedding.clone(),
        ));
        Self::with_providers(cfg, Providers::from_profiles(svc))
    }

    /// Same as [`AppState::new`] with caller-supplied providers.
    pub fn with_providers(cfg: AppConfig, providers: Providers) -> Result<Self, ConfigError> {
        let store =
            RagStore::new(cfg.rag.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self {
            sessions: Arc::new(SessionStore::new(cfg.session_idle)),
            cfg: Arc::new(cfg),
            store,
            providers,
        })
    }
}
