//! Embedding providers used by indexing and retrieval.

use futures::future::BoxFuture;

use crate::errors::RagError;

pub mod hash_embedder;
pub mod llm_embedder;

/// Provider interface for embedding generation.
///
/// Async because real providers perform HTTP requests. Implement this trait to
/// plug in another backend or a test double.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>>;
}
