//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - Clients are built on first use, so a missing credential is reported by
//!   the first `generate`/`embed` call rather than at construction.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::{
        gemini_service::GeminiService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// Shared service that routes calls to the **generation** and **embedding** profiles.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,

    gemini: RwLock<HashMap<ClientKey, Arc<GeminiService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
}

impl LlmServiceProfiles {
    /// Creates the service. No network or credential checks happen here.
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Self {
        Self {
            generation,
            embedding,
            gemini: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            ollama: RwLock::new(HashMap::new()),
        }
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let cfg = &self.generation;
        match cfg.provider {
            LlmProvider::Gemini => get_or_init(&self.gemini, cfg, GeminiService::new)
                .await?
                .generate(prompt, system)
                .await,
            LlmProvider::OpenAI => get_or_init(&self.openai, cfg, OpenAiService::new)
                .await?
                .generate(prompt, system)
                .await,
            LlmProvider::Ollama => get_or_init(&self.ollama, cfg, OllamaService::new)
                .await?
                .generate(prompt, system)
                .await,
        }
    }

    /// Computes embeddings using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = &self.embedding;
        match cfg.provider {
            LlmProvider::Gemini => get_or_init(&self.gemini, cfg, GeminiService::new)
                .await?
                .embeddings(input)
                .await,
            LlmProvider::OpenAI => get_or_init(&self.openai, cfg, OpenAiService::new)
                .await?
                .embeddings(input)
                .await,
            LlmProvider::Ollama => get_or_init(&self.ollama, cfg, OllamaService::new)
                .await?
                .embeddings(input)
                .await,
        }
    }
}

/// Returns the cached client for `cfg`, building it on a miss.
///
/// A failed build is not cached, so the next call retries construction.
async fn get_or_init<T>(
    cache: &RwLock<HashMap<ClientKey, Arc<T>>>,
    cfg: &LlmModelConfig,
    build: fn(LlmModelConfig) -> Result<T, AiLlmError>,
) -> Result<Arc<T>, AiLlmError> {
    let key = ClientKey::from(cfg);
    if let Some(cli) = cache.read().await.get(&key).cloned() {
        return Ok(cli);
    }
    let mut w = cache.write().await;
    if let Some(cli) = w.get(&key).cloned() {
        return Ok(cli);
    }
    let cli = Arc::new(build(cfg.clone())?);
    w.insert(key, cli.clone());
    Ok(cli)
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config::{embedding_config, generation_config};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[tokio::test]
    async fn missing_key_fails_on_first_call() {
        let svc = LlmServiceProfiles::new(
            generation_config(&no_env).unwrap(),
            embedding_config(&no_env).unwrap(),
        );

        let err = svc.embed("hello").await.unwrap_err();
        assert!(err.is_missing_api_key());
        let err = svc.generate("hello", None).await.unwrap_err();
        assert!(err.is_missing_api_key());
        assert!(svc.gemini.read().await.is_empty());
    }

    #[tokio::test]
    async fn caches_one_client_per_config() {
        let lookup = |k: &str| (k == "GEMINI_API_KEY").then(|| "k".to_string());
        let generation = generation_config(&lookup).unwrap();
        let cache = RwLock::new(HashMap::new());

        let a = get_or_init(&cache, &generation, GeminiService::new).await.unwrap();
        let b = get_or_init(&cache, &generation, GeminiService::new).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.read().await.len(), 1);
    }
}
