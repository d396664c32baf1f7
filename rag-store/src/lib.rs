//! Document ingestion and vector indexing for question answering.
//!
//! This crate provides a small API to:
//! - Load an uploaded file (or a default folder) into [`Document`]s
//! - Split documents into overlapping [`TextSegment`]s
//! - Embed segments and keep them in a persisted [`VectorIndex`]
//!
//! The design is flat and splits responsibilities into focused modules.

mod config;
pub mod embed;
mod errors;
mod index;
mod ingest;
mod loader;
mod record;
mod splitter;
mod vector_index;

pub use config::{INDEX_FILE_NAME, RagConfig};
pub use embed::{
    EmbeddingsProvider, hash_embedder::HashEmbedder, llm_embedder::LlmEmbedder,
};
pub use errors::RagError;
pub use index::{IndexStats, build_index};
pub use ingest::{Upload, load_data_from_upload};
pub use loader::{DocumentLoader, FileLoader, LoadSource};
pub use record::{Document, DocumentMetadata, RagHit, TextSegment};
pub use splitter::SentenceSplitter;
pub use vector_index::{IndexEntry, VectorIndex, cosine};

use std::sync::Arc;

use tracing::trace;

/// High-level facade that wires configuration and the document loader.
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    cfg: RagConfig,
    loader: Arc<dyn DocumentLoader>,
}

impl RagStore {
    /// Constructs a store with the default [`FileLoader`].
    ///
    /// # Errors
    /// Returns `RagError::Config` if the configuration is invalid.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        Self::with_loader(cfg, Arc::new(FileLoader))
    }

    /// Constructs a store with a custom loader.
    pub fn with_loader(cfg: RagConfig, loader: Arc<dyn DocumentLoader>) -> Result<Self, RagError> {
        cfg.validate()?;
        trace!(storage = %cfg.storage_dir.display(), "RagStore::new");
        Ok(Self { cfg, loader })
    }

    /// Loads documents from `upload`, or from the configured data folder.
    pub async fn load_documents(&self, upload: Option<Upload>) -> Result<Vec<Document>, RagError> {
        load_data_from_upload(upload, &self.cfg, Arc::clone(&self.loader)).await
    }

    /// Splits, embeds and persists `documents`, replacing any stored index.
    pub async fn build_index(
        &self,
        documents: &[Document],
        provider: &dyn EmbeddingsProvider,
    ) -> Result<(Arc<VectorIndex>, IndexStats), RagError> {
        build_index(documents, &self.cfg, provider).await
    }

    /// Reloads the last persisted index from the storage folder.
    pub async fn load_index(&self) -> Result<Arc<VectorIndex>, RagError> {
        let dir = self.cfg.storage_dir.clone();
        let index = tokio::task::spawn_blocking(move || VectorIndex::load(&dir)).await??;
        Ok(Arc::new(index))
    }
}
