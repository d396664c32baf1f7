//! Builds a [`VectorIndex`] from loaded documents and persists it.

use std::{path::PathBuf, sync::Arc, time::Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::RagConfig, embed::EmbeddingsProvider, errors::RagError, record::Document,
    splitter::SentenceSplitter, vector_index::VectorIndex,
};

/// Summary of one index build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub segments: usize,
    pub dim: usize,
    pub path: PathBuf,
    pub elapsed_ms: u128,
}

/// Splits, embeds (sequentially, in segment order) and persists `documents`.
///
/// # Errors
/// - `Config` for an invalid splitter window
/// - `EmptyIndex` when no document has non-blank text
/// - any embedding error, unchanged
/// - `VectorSizeMismatch` when the provider returns vectors of varying size
/// - `Io` / `Json` when persisting fails
pub async fn build_index(
    documents: &[Document],
    cfg: &RagConfig,
    provider: &dyn EmbeddingsProvider,
) -> Result<(Arc<VectorIndex>, IndexStats), RagError> {
    cfg.validate()?;
    let started = Instant::now();
    let splitter = SentenceSplitter::from_config(cfg)?;

    let segments: Vec<_> = documents.iter().flat_map(|d| splitter.split(d)).collect();
    if segments.is_empty() {
        return Err(RagError::EmptyIndex);
    }
    debug!(
        documents = documents.len(),
        segments = segments.len(),
        "documents split"
    );

    let mut index = VectorIndex::new();
    for segment in segments {
        let vector = provider.embed(&segment.text).await?;
        index.insert(segment, vector)?;
    }

    let index = Arc::new(index);
    let storage_dir = cfg.storage_dir.clone();
    let to_persist = Arc::clone(&index);
    let path = tokio::task::spawn_blocking(move || to_persist.persist(&storage_dir)).await??;

    let stats = IndexStats {
        documents: documents.len(),
        segments: index.len(),
        dim: index.dim().unwrap_or_default(),
        path,
        elapsed_ms: started.elapsed().as_millis(),
    };
    info!(
        documents = stats.documents,
        segments = stats.segments,
        dim = stats.dim,
        elapsed_ms = stats.elapsed_ms,
        "index built"
    );
    Ok((index, stats))
}
