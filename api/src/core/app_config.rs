//! Immutable application configuration, built once at startup.

use std::{path::PathBuf, time::Duration};

use ai_llm_service::{
    AiLlmError, LlmModelConfig,
    config::default_config::{DEFAULT_MAX_TOKENS, embedding_config, generation_config},
};
use contextor::QueryConfig;
use rag_store::RagConfig;
use thiserror::Error;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8501";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error("invalid number in {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub address: String,
    pub generation: LlmModelConfig,
    pub embedding: LlmModelConfig,
    pub rag: RagConfig,
    pub query: QueryConfig,
    pub max_upload_bytes: usize,
    pub session_idle: Duration,
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded by the binary).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup. Unset or blank keys take defaults.
    ///
    /// A missing API key is accepted here; the first provider call reports it.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let generation = generation_config(lookup)?;
        let embedding = embedding_config(lookup)?;

        let rag_defaults = RagConfig::default();
        let rag = RagConfig {
            chunk_size: number(lookup, "CHUNK_SIZE", rag_defaults.chunk_size)?,
            chunk_overlap: number(lookup, "CHUNK_OVERLAP", rag_defaults.chunk_overlap)?,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(rag_defaults.data_dir),
            storage_dir: get("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(rag_defaults.storage_dir),
            scratch_root: get("SCRATCH_DIR").map(PathBuf::from),
        };
        rag.validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let query_defaults = QueryConfig::default();
        let query = QueryConfig {
            similarity_top_k: number(lookup, "RAG_TOP_K", query_defaults.similarity_top_k)?,
            num_output: generation.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            context_window: number(lookup, "LLM_CONTEXT_WINDOW", query_defaults.context_window)?,
        };
        query
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let max_upload_bytes = number(lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("MAX_UPLOAD_BYTES must be > 0".into()));
        }

        Ok(Self {
            address: get("API_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            generation,
            embedding,
            rag,
            query,
            max_upload_bytes,
            session_idle: Duration::from_secs(number(
                lookup,
                "SESSION_IDLE_SECS",
                DEFAULT_SESSION_IDLE_SECS,
            )?),
        })
    }
}

fn number<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: v }),
        None => Ok(default),
    }
}
