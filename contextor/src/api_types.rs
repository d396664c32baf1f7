//! Public API types re-used by external crates (e.g., the HTTP API layer).

use serde::Serialize;

/// A retrieved segment that was fed to the LLM.
///
/// # Example
/// ```
/// use contextor::UsedChunk;
/// let c = UsedChunk {
///     score: 0.92,
///     file_name: "sky.txt".into(),
///     start_char: 0,
///     end_char: 16,
///     text: "The sky is blue.".into(),
/// };
/// assert!(c.score > 0.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsedChunk {
    pub score: f32,
    pub file_name: String,
    pub start_char: usize,
    pub end_char: usize,
    pub text: String,
}

/// Model answer, unchanged, together with the retrieved segments.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub sources: Vec<UsedChunk>,
}
