//! Fixed-window text splitter.
//!
//! Windows hold at most `chunk_size` characters and consecutive windows of a
//! document share `chunk_overlap` characters. A window end is pulled back to
//! the last whitespace inside it when that still leaves room past the overlap,
//! so words are normally not cut at the end of a segment.

use crate::{
    config::RagConfig,
    errors::RagError,
    record::{Document, TextSegment},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "invalid splitter window: size={chunk_size} overlap={chunk_overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(cfg: &RagConfig) -> Result<Self, RagError> {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    /// Char offset windows `(start, end)` over `text`, blank windows omitted.
    pub fn windows(&self, text: &str) -> Vec<(usize, usize)> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut out = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);
            if end < len {
                let floor = start + self.chunk_overlap;
                if let Some(p) = (floor + 1..end).rev().find(|&p| chars[p].is_whitespace()) {
                    end = p;
                }
            }

            if chars[start..end].iter().any(|c| !c.is_whitespace()) {
                out.push((start, end));
            }
            if end == len {
                break;
            }
            start = end - self.chunk_overlap;
        }
        out
    }

    /// Splits one document into ordered segments.
    pub fn split(&self, doc: &Document) -> Vec<TextSegment> {
        let chars: Vec<char> = doc.text.chars().collect();
        self.windows(&doc.text)
            .into_iter()
            .enumerate()
            .map(|(n, (start, end))| TextSegment {
                id: format!("{}-{n}", doc.id),
                doc_id: doc.id.clone(),
                file_name: doc.metadata.file_name.clone(),
                text: chars[start..end].iter().collect(),
                start_char: start,
                end_char: end,
            })
            .collect()
    }
}
