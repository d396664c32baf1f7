//! Completion provider seam.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::future::BoxFuture;

use crate::error::ContextorError;

/// Turns a finished prompt into the model's answer text.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ContextorError>>;
}

/// Completes through the generation profile of the shared LLM service.
#[derive(Clone)]
pub struct LlmCompleter {
    svc: Arc<LlmServiceProfiles>,
}

impl LlmCompleter {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl CompletionProvider for LlmCompleter {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ContextorError>> {
        Box::pin(async move { Ok(self.svc.generate(prompt, None).await?) })
    }
}
