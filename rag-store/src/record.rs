//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Where a document came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: u64,
}

/// Text extracted from one file. Discarded once the index is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Bounded substring of a document's text.
///
/// `start_char..end_char` are char offsets into the source document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub id: String,
    pub doc_id: String,
    pub file_name: String,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
}

/// A single retrieval hit with cosine score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RagHit {
    pub score: f32,
    pub segment: TextSegment,
}

/// Guesses a MIME-like type from the file extension.
pub fn file_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "text" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        _ => "application/octet-stream",
    }
}
