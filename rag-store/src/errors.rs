//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors (persisted index).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A document could not be loaded or parsed.
    #[error("failed to load {path}: {reason}")]
    Ingest { path: PathBuf, reason: String },

    /// Nothing to index (no documents, or only blank text).
    #[error("no text to index")]
    EmptyIndex,

    /// Mismatch in vector dimensionality across entries.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding provider failed without a more specific cause.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Embedding provider failed while calling an LLM backend.
    #[error("embedding error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RagError {
    pub(crate) fn ingest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RagError::Ingest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
