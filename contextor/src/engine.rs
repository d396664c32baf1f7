//! Query engine bound to one built index.

use std::{sync::Arc, time::Instant};

use rag_store::{EmbeddingsProvider, VectorIndex};
use tracing::{debug, info};

use crate::{
    api_types::{QaAnswer, UsedChunk},
    cfg::QueryConfig,
    error::ContextorError,
    llm::CompletionProvider,
    prompt,
};

/// Answers questions against one [`VectorIndex`].
///
/// Cheap to share behind `Arc`; holds no mutable state.
#[derive(Clone)]
pub struct QueryEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    completer: Arc<dyn CompletionProvider>,
    cfg: QueryConfig,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("segments", &self.index.len())
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl QueryEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
        completer: Arc<dyn CompletionProvider>,
        cfg: QueryConfig,
    ) -> Result<Self, ContextorError> {
        cfg.validate()?;
        Ok(Self {
            index,
            embedder,
            completer,
            cfg,
        })
    }

    /// Embeds the question, retrieves the top-k segments, and returns the
    /// completion text unchanged.
    ///
    /// # Errors
    /// - [`ContextorError::EmptyQuestion`] for blank input, before any call
    /// - embedding, retrieval and completion errors, unchanged
    pub async fn query(&self, question: &str) -> Result<QaAnswer, ContextorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ContextorError::EmptyQuestion);
        }
        let started = Instant::now();

        let qvec = self.embedder.embed(question).await?;
        let hits = self.index.top_k(&qvec, self.cfg.similarity_top_k)?;
        debug!(
            hits = hits.len(),
            best = hits.first().map(|h| h.score).unwrap_or_default(),
            "retrieved context"
        );

        let built = prompt::build_prompt(question, &hits, &self.cfg);
        let answer = self.completer.complete(&built.prompt).await?;

        info!(
            question_len = question.len(),
            segments_used = built.segments_used,
            truncated = built.truncated,
            answer_len = answer.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "question answered"
        );

        let sources = hits
            .into_iter()
            .take(built.segments_used)
            .map(|h| UsedChunk {
                score: h.score,
                file_name: h.segment.file_name,
                start_char: h.segment.start_char,
                end_char: h.segment.end_char,
                text: h.segment.text,
            })
            .collect();

        Ok(QaAnswer { answer, sources })
    }
}
