//! Ingestion and indexing configuration.

use std::path::PathBuf;

use crate::errors::RagError;

/// File name of the persisted index inside `storage_dir`.
pub const INDEX_FILE_NAME: &str = "vector_store.json";

/// Configuration for loading, splitting and persisting documents.
#[derive(Clone, Debug, PartialEq)]
pub struct RagConfig {
    /// Maximum segment length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive segments of one document.
    pub chunk_overlap: usize,
    /// Folder loaded when no upload is given.
    pub data_dir: PathBuf,
    /// Folder receiving the persisted index (overwritten on each build).
    pub storage_dir: PathBuf,
    /// Parent for upload scratch dirs. `None` uses the system temp dir.
    pub scratch_root: Option<PathBuf>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 20,
            data_dir: PathBuf::from("Data"),
            storage_dir: PathBuf::from("storage"),
            scratch_root: None,
        }
    }
}

impl RagConfig {
    /// Path of the persisted index file.
    pub fn index_path(&self) -> PathBuf {
        self.storage_dir.join(INDEX_FILE_NAME)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(RagError::Config("storage_dir is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RagConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.index_path(), PathBuf::from("storage/vector_store.json"));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let cfg = RagConfig {
            chunk_size: 10,
            chunk_overlap: 10,
            ..RagConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
    }
}
