//! Query-time configuration.

use crate::error::ContextorError;

/// Retrieval and generation budget for one [`crate::QueryEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    /// Segments retrieved per question.
    pub similarity_top_k: usize,
    /// Tokens reserved for the model's answer.
    pub num_output: u32,
    /// Total tokens the model accepts (prompt + answer).
    pub context_window: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            similarity_top_k: 2,
            num_output: 512,
            context_window: 3900,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.similarity_top_k == 0 {
            return Err(ContextorError::Config("similarity_top_k must be > 0".into()));
        }
        if self.num_output >= self.context_window {
            return Err(ContextorError::Config(format!(
                "num_output ({}) must be smaller than context_window ({})",
                self.num_output, self.context_window
            )));
        }
        Ok(())
    }
}
