//! Shared LLM access layer used by the indexing and question-answering crates.
//!
//! - [`config`] holds provider/model configs and env-driven defaults.
//! - [`services`] contains thin HTTP clients per provider.
//! - [`service_profiles::LlmServiceProfiles`] routes generation and embedding
//!   calls to the right client.
//! - [`telemetry`] provides a library-scoped `tracing` layer.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use service_profiles::LlmServiceProfiles;
