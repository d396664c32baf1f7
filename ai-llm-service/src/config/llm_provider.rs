use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for LLM inference and embeddings.
///
/// `Gemini` is the hosted default. `OpenAI` covers any OpenAI-compatible API,
/// `Ollama` a local runtime.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let p: LlmProvider = "gemini".parse().unwrap();
/// assert_eq!(p, LlmProvider::Gemini);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Gemini API (Generative Language API).
    Gemini,
    /// OpenAI (or compatible) REST API.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
}

impl LlmProvider {
    /// Base URL used when `LLM_ENDPOINT` is not set.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variable holding the provider credential, if it needs one.
    pub fn api_key_var(self) -> Option<&'static str> {
        match self {
            LlmProvider::Gemini => Some("GEMINI_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }

    /// Generation model used when `LLM_MODEL` is not set.
    pub fn default_generation_model(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "models/gemini-2.0-flash",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Ollama => "llama3.1",
        }
    }

    /// Embedding model used when `EMBEDDING_MODEL` is not set.
    pub fn default_embedding_model(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "models/text-embedding-004",
            LlmProvider::OpenAI => "text-embedding-3-small",
            LlmProvider::Ollama => "nomic-embed-text",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("chatgpt".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" ollama ".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!("claude-9000".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn only_hosted_providers_need_keys() {
        assert_eq!(LlmProvider::Gemini.api_key_var(), Some("GEMINI_API_KEY"));
        assert_eq!(LlmProvider::Ollama.api_key_var(), None);
    }
}
