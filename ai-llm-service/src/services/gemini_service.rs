//! Google Gemini service for text generation and embeddings.
//!
//! Thin, non-streaming client for the Generative Language REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint` and the model name:
//! - POST {endpoint}/models/{model}:generateContent
//! - POST {endpoint}/models/{model}:embedContent
//!
//! Authentication uses the `x-goog-api-key` header.
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Gemini`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, ProviderError, ProviderErrorKind, is_http_url, make_snippet,
    },
};

/// Thin client for the Gemini API.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embed: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Gemini
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is not an HTTP URL
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(fail(ProviderErrorKind::InvalidProvider));
        }

        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| fail(ProviderErrorKind::MissingApiKey))?;

        if !is_http_url(&cfg.endpoint) {
            return Err(fail(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(60));

        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(api_key.trim()).map_err(|e| {
            fail(ProviderErrorKind::Decode(format!("invalid API key header: {e}")))
        })?;
        key_value.set_sensitive(true);
        headers.insert("x-goog-api-key", key_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        let url_generate = method_url(cfg.base_url(), &cfg.model, "generateContent");
        let url_embed = method_url(cfg.base_url(), &cfg.model, "embedContent");

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embed,
        })
    }

    /// Performs a single non-streaming `generateContent` call.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for network failures and timeouts
    /// - `Decode` / `EmptyResponse` when no candidate text is returned
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt, system);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_generate
        );

        let resp = self.client.post(&self.url_generate).json(&body).send().await?;
        let raw = read_success(resp, &self.url_generate, started).await?;
        let text = parse_generate_response(&raw)?;

        info!(
            model = %self.cfg.model,
            answer_len = text.len(),
            latency_ms = started.elapsed().as_millis(),
            "gemini generateContent completed"
        );

        Ok(text)
    }

    /// Retrieves a single embedding vector via `embedContent`.
    ///
    /// # Errors
    /// Same as [`GeminiService::generate`].
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let model = qualified_model(&self.cfg.model);
        let body = EmbedContentRequest {
            model: &model,
            content: Content {
                role: None,
                parts: vec![Part { text: input }],
            },
        };

        debug!(model = %self.cfg.model, input_len = input.len(), "POST {}", self.url_embed);

        let resp = self.client.post(&self.url_embed).json(&body).send().await?;
        let raw = read_success(resp, &self.url_embed, started).await?;
        let values = parse_embed_response(&raw)?;

        debug!(
            model = %self.cfg.model,
            dim = values.len(),
            latency_ms = started.elapsed().as_millis(),
            "gemini embedContent completed"
        );

        Ok(values)
    }
}

fn fail(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(LlmProvider::Gemini, kind).into()
}

/// Accepts both `gemini-2.0-flash` and `models/gemini-2.0-flash`.
fn qualified_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn method_url(base: &str, model: &str, method: &str) -> String {
    format!("{}/{}:{}", base, qualified_model(model), method)
}

async fn read_success(
    resp: reqwest::Response,
    url: &str,
    started: Instant,
) -> Result<String, AiLlmError> {
    let status = resp.status();
    let text = resp.text().await?;
    if status.is_success() {
        return Ok(text);
    }

    let snippet = make_snippet(&text);
    error!(
        %status,
        %url,
        %snippet,
        latency_ms = started.elapsed().as_millis(),
        "Gemini returned non-success status"
    );
    Err(fail(ProviderErrorKind::HttpStatus(HttpError {
        status,
        url: url.to_string(),
        snippet,
    })))
}

fn parse_generate_response(raw: &str) -> Result<String, AiLlmError> {
    let out: GenerateContentResponse = serde_json::from_str(raw).map_err(|e| {
        fail(ProviderErrorKind::Decode(format!(
            "serde error: {e}; expected `candidates[0].content.parts[].text`"
        )))
    })?;

    let text: String = out
        .candidates
        .into_iter()
        .find_map(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(fail(ProviderErrorKind::EmptyResponse));
    }
    Ok(text)
}

fn parse_embed_response(raw: &str) -> Result<Vec<f32>, AiLlmError> {
    let out: EmbedContentResponse = serde_json::from_str(raw).map_err(|e| {
        fail(ProviderErrorKind::Decode(format!(
            "serde error: {e}; expected `embedding.values`"
        )))
    })?;
    if out.embedding.values.is_empty() {
        return Err(fail(ProviderErrorKind::EmptyResponse));
    }
    Ok(out.embedding.values)
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part { text: s }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: cfg.max_tokens,
                temperature: cfg.temperature,
                top_p: cfg.top_p,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(api_key: Option<&str>) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "models/gemini-2.0-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/".into(),
            api_key: api_key.map(str::to_string),
            max_tokens: Some(512),
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn builds_method_urls() {
        assert_eq!(
            method_url("https://h/v1beta", "gemini-2.0-flash", "generateContent"),
            "https://h/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            method_url("https://h/v1beta", "models/text-embedding-004", "embedContent"),
            "https://h/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn missing_key_is_reported() {
        let err = GeminiService::new(cfg(None)).unwrap_err();
        assert!(err.is_missing_api_key());
        let err = GeminiService::new(cfg(Some("  "))).unwrap_err();
        assert!(err.is_missing_api_key());
    }

    #[test]
    fn rejects_foreign_provider() {
        let mut c = cfg(Some("k"));
        c.provider = LlmProvider::Ollama;
        assert!(GeminiService::new(c).is_err());
    }

    #[test]
    fn request_body_shape() {
        let c = cfg(Some("k"));
        let body = GenerateContentRequest::from_cfg(&c, "hello", Some("be brief"));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 512);
        assert!(v["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn parses_candidate_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"The sky "},{"text":"is blue."}],"role":"model"}}]}"#;
        assert_eq!(parse_generate_response(raw).unwrap(), "The sky is blue.");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let err = parse_generate_response(r#"{"candidates":[]}"#).unwrap_err();
        assert!(err.to_string().contains("empty response"));
        assert!(parse_generate_response("not json").is_err());
    }

    #[test]
    fn parses_embedding_values() {
        let raw = r#"{"embedding":{"values":[0.5,-1.0,0.25]}}"#;
        assert_eq!(parse_embed_response(raw).unwrap(), vec![0.5, -1.0, 0.25]);
        assert!(parse_embed_response(r#"{"embedding":{"values":[]}}"#).is_err());
    }
}
