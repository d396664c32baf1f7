//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (retrieval, embedding).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Completion call failed inside the shared LLM service.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Completion provider failed without a more specific cause.
    #[error("completion error: {0}")]
    Completion(String),

    /// The question was empty or whitespace only.
    #[error("question must not be empty")]
    EmptyQuestion,

    /// Invalid query configuration.
    #[error("config error: {0}")]
    Config(String),
}
