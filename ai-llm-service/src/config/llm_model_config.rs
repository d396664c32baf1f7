use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which backend to use (Gemini, OpenAI, Ollama).
/// - `model`: The model identifier (e.g., `"models/gemini-2.0-flash"`).
/// - `endpoint`: Base URL of the API.
/// - `api_key`: Credential for hosted providers. May be `None`; calls then
///   fail with `MissingApiKey` on first use.
/// - `max_tokens`: Maximum number of tokens to generate.
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "models/gemini-2.0-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
///     api_key: Some("secret".to_string()),
///     max_tokens: Some(512),
///     temperature: Some(0.1),
///     top_p: None,
///     timeout_secs: Some(120),
/// };
/// assert_eq!(cfg.base_url(), "https://generativelanguage.googleapis.com/v1beta");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Endpoint without surrounding whitespace or trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
