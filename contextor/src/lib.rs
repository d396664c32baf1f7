//! Retrieval-augmented question answering over a freshly built index.
//!
//! Public API: [`build_query_engine`] turns loaded documents into a
//! [`QueryEngine`]; [`QueryEngine::query`] embeds a question, retrieves top-K
//! segments, builds a budgeted prompt, and returns the model answer.

mod api_types;
mod cfg;
mod engine;
mod error;
mod llm;
pub mod prompt;

pub use api_types::{QaAnswer, UsedChunk};
pub use cfg::QueryConfig;
pub use engine::QueryEngine;
pub use error::ContextorError;
pub use llm::{CompletionProvider, LlmCompleter};

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use rag_store::{Document, EmbeddingsProvider, IndexStats, LlmEmbedder, RagStore};

/// The two external capabilities a query engine needs.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingsProvider>,
    pub completer: Arc<dyn CompletionProvider>,
}

impl Providers {
    /// Both capabilities backed by the shared LLM service.
    pub fn from_profiles(svc: Arc<LlmServiceProfiles>) -> Self {
        Self {
            embedder: Arc::new(LlmEmbedder::new(Arc::clone(&svc))),
            completer: Arc::new(LlmCompleter::new(svc)),
        }
    }
}

/// Indexes `documents` (persisting the index through `store`) and returns an
/// engine bound to the new index.
///
/// # Errors
/// Any indexing or embedding error, or an invalid `cfg`.
pub async fn build_query_engine(
    store: &RagStore,
    documents: &[Document],
    providers: &Providers,
    cfg: QueryConfig,
) -> Result<(QueryEngine, IndexStats), ContextorError> {
    cfg.validate()?;
    let (index, stats) = store
        .build_index(documents, providers.embedder.as_ref())
        .await?;
    let engine = QueryEngine::new(
        index,
        Arc::clone(&providers.embedder),
        Arc::clone(&providers.completer),
        cfg,
    )?;
    Ok((engine, stats))
}
