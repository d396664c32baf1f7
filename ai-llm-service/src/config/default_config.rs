//! Default LLM configs built from environment-style lookups.
//!
//! Two roles are resolved from the same set of variables:
//!
//! - **Generation** → answers questions over retrieved context
//! - **Embedding**  → vectors for segments and questions
//!
//! # Environment variables
//!
//! - `LLM_KIND`           = provider kind (`gemini` default, `openai`, `ollama`)
//! - `LLM_ENDPOINT`       = base URL (provider default when unset)
//! - `LLM_MODEL`          = generation model
//! - `EMBEDDING_MODEL`    = embedding model
//! - `LLM_MAX_TOKENS`     = max output tokens (default 512)
//! - `LLM_TIMEOUT_SECS`   = request timeout (default 120)
//! - `GEMINI_API_KEY` / `OPENAI_API_KEY` = credential, optional here
//!
//! A missing credential is not an error at this stage. The provider client
//! reports it on the first call.

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, Result, opt_u32, opt_u64, opt_var, validate_http_endpoint},
};

pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn provider(lookup: &dyn Fn(&str) -> Option<String>) -> Result<LlmProvider> {
    match opt_var(lookup, "LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::Gemini),
    }
}

fn endpoint(lookup: &dyn Fn(&str) -> Option<String>, provider: LlmProvider) -> Result<String> {
    match opt_var(lookup, "LLM_ENDPOINT") {
        Some(url) => {
            validate_http_endpoint("LLM_ENDPOINT", &url)?;
            Ok(url.trim().to_string())
        }
        None => Ok(provider.default_endpoint().to_string()),
    }
}

fn api_key(lookup: &dyn Fn(&str) -> Option<String>, provider: LlmProvider) -> Option<String> {
    provider
        .api_key_var()
        .and_then(|var| opt_var(lookup, var))
        .map(|k| k.trim().to_string())
}

/// Constructs the config for the answer-generation model.
///
/// # Defaults
/// - `temperature = Some(0.1)`
/// - `max_tokens = Some(512)`
/// - `timeout_secs = Some(120)`
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - [`ConfigError::InvalidNumber`] for malformed limits
/// - [`ConfigError::InvalidFormat`] for a non-HTTP endpoint
pub fn generation_config(lookup: &dyn Fn(&str) -> Option<String>) -> Result<LlmModelConfig> {
    let provider = provider(lookup)?;
    let model = opt_var(lookup, "LLM_MODEL")
        .unwrap_or_else(|| provider.default_generation_model().to_string());
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    Ok(LlmModelConfig {
        provider,
        model: model.trim().to_string(),
        endpoint: endpoint(lookup, provider)?,
        api_key: api_key(lookup, provider),
        max_tokens: Some(opt_u32(lookup, "LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS)),
        temperature: Some(0.1),
        top_p: None,
        timeout_secs: Some(opt_u64(lookup, "LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Constructs the config for the embedding model.
///
/// Sampling parameters do not apply to embeddings and are left unset.
pub fn embedding_config(lookup: &dyn Fn(&str) -> Option<String>) -> Result<LlmModelConfig> {
    let provider = provider(lookup)?;
    let model = opt_var(lookup, "EMBEDDING_MODEL")
        .unwrap_or_else(|| provider.default_embedding_model().to_string());

    Ok(LlmModelConfig {
        provider,
        model: model.trim().to_string(),
        endpoint: endpoint(lookup, provider)?,
        api_key: api_key(lookup, provider),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(opt_u64(lookup, "LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// [`generation_config`] over the process environment.
pub fn generation_config_from_env() -> Result<LlmModelConfig> {
    generation_config(&|k| std::env::var(k).ok())
}

/// [`embedding_config`] over the process environment.
pub fn embedding_config_from_env() -> Result<LlmModelConfig> {
    embedding_config(&|k| std::env::var(k).ok())
}
