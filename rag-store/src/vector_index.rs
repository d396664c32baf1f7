//! In-process vector index with cosine top-k search and JSON persistence.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::INDEX_FILE_NAME,
    errors::RagError,
    record::{RagHit, TextSegment},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub segment: TextSegment,
    pub vector: Vec<f32>,
}

/// All vectors share one dimension, fixed by the first insert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    created_at: DateTime<Utc>,
    dim: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            dim: None,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Adds one entry.
    ///
    /// # Errors
    /// `VectorSizeMismatch` if `vector` differs in length from earlier entries
    /// (an empty vector counts as a mismatch).
    pub fn insert(&mut self, segment: TextSegment, vector: Vec<f32>) -> Result<(), RagError> {
        let want = self.dim.unwrap_or(vector.len());
        if vector.is_empty() || vector.len() != want {
            return Err(RagError::VectorSizeMismatch {
                got: vector.len(),
                want,
            });
        }
        self.dim = Some(want);
        self.entries.push(IndexEntry { segment, vector });
        Ok(())
    }

    /// Returns up to `k` entries ordered by descending cosine similarity.
    /// Ties keep insertion order.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<RagHit>, RagError> {
        if let Some(want) = self.dim {
            if query.len() != want {
                return Err(RagError::VectorSizeMismatch {
                    got: query.len(),
                    want,
                });
            }
        }

        let mut hits: Vec<RagHit> = self
            .entries
            .iter()
            .map(|e| RagHit {
                score: cosine(query, &e.vector),
                segment: e.segment.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    /// Writes the index to `<dir>/vector_store.json`, replacing any previous one.
    ///
    /// Each call writes its own temp file next to the target and renames it
    /// into place. With concurrent saves the last rename wins.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, RagError> {
        fs::create_dir_all(dir)?;
        let target = dir.join(INDEX_FILE_NAME);

        let bytes = serde_json::to_vec(self)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".vector_store-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| RagError::Io(e.error))?;

        info!(
            path = %target.display(),
            entries = self.entries.len(),
            bytes = bytes.len(),
            "vector index persisted"
        );
        Ok(target)
    }

    /// Reads an index previously written by [`VectorIndex::persist`].
    pub fn load(dir: &Path) -> Result<Self, RagError> {
        let path = dir.join(INDEX_FILE_NAME);
        let raw = fs::read(&path)?;
        let index: VectorIndex = serde_json::from_slice(&raw)?;
        debug!(path = %path.display(), entries = index.len(), "vector index loaded");
        Ok(index)
    }
}

/// Cosine similarity; 0.0 when either side has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}
