//! Turns files on disk into [`Document`]s.
//!
//! `.pdf` files go through `pdf-extract`; everything else is read as UTF-8
//! with invalid bytes replaced. Loaders are synchronous and are expected to
//! run on the blocking pool.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    errors::RagError,
    record::{Document, DocumentMetadata, file_type_for},
};

/// What a loader should read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadSource {
    /// Exactly these files.
    Files(Vec<PathBuf>),
    /// Every non-hidden file below this folder, recursively.
    Dir(PathBuf),
}

/// Reads documents from the filesystem.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, source: &LoadSource) -> Result<Vec<Document>, RagError>;
}

/// Default loader: one document per file.
#[derive(Clone, Debug, Default)]
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn load(&self, source: &LoadSource) -> Result<Vec<Document>, RagError> {
        let files = match source {
            LoadSource::Files(files) => files.clone(),
            LoadSource::Dir(dir) => list_dir(dir)?,
        };
        files.iter().map(|p| load_file(p)).collect()
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, RagError> {
    if !dir.is_dir() {
        return Err(RagError::ingest(dir, "directory does not exist"));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.map_err(|e| RagError::ingest(dir, e.to_string()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(RagError::ingest(dir, "no files found"));
    }
    debug!(dir = %dir.display(), files = files.len(), "listed input folder");
    Ok(files)
}

/// Reads one file into a [`Document`].
pub fn load_file(path: &Path) -> Result<Document, RagError> {
    let bytes = fs::read(path).map_err(|e| RagError::ingest(path, e.to_string()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_type = file_type_for(&file_name);

    let text = if file_type == "application/pdf" {
        // pdf-extract panics on some malformed fonts.
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| RagError::ingest(path, "pdf extraction panicked"))?
            .map_err(|e| RagError::ingest(path, format!("pdf extraction failed: {e}")))?
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    if text.trim().is_empty() {
        warn!(file = %file_name, "document has no extractable text");
    }

    Ok(Document {
        id: uuid::Uuid::new_v4().to_string(),
        text,
        metadata: DocumentMetadata {
            file_name,
            file_path: path.display().to_string(),
            file_type: file_type.to_string(),
            file_size: bytes.len() as u64,
        },
    })
}
