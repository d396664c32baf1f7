use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use rag_store::RagError;
use thiserror::Error;

use crate::core::{app_config::ConfigError, http::response_envelope::ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / server ---
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload rejected: {0}")]
    Upload(#[from] MultipartError),

    #[error("no document has been processed yet")]
    NoDocument,

    // --- Pipeline stages ---
    #[error("{0}")]
    Ingest(#[source] RagError),

    #[error("{0}")]
    Index(#[source] ContextorError),

    #[error("{0}")]
    Query(#[source] ContextorError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(e) => e.status(),
            AppError::NoDocument => StatusCode::CONFLICT,
            AppError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Query(ContextorError::EmptyQuestion) => StatusCode::BAD_REQUEST,
            AppError::Index(_) | AppError::Query(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Bind { .. } | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Upload(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "PAYLOAD_TOO_LARGE"
            }
            AppError::Upload(_) => "BAD_REQUEST",
            AppError::NoDocument => "NO_DOCUMENT",
            AppError::Ingest(_) => "INGEST_FAILED",
            AppError::Index(_) => "INDEX_FAILED",
            AppError::Query(ContextorError::EmptyQuestion) => "BAD_REQUEST",
            AppError::Query(_) => "QUERY_FAILED",
        }
    }

    /// Short label for the page's error banner.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Ingest(_) | AppError::Upload(_) => "Ingestion error",
            AppError::Index(_) => "Indexing error",
            AppError::Query(_) => "Query error",
            AppError::NoDocument | AppError::BadRequest(_) => "Invalid request",
            AppError::Config(_) | AppError::Bind { .. } | AppError::Server(_) => "Server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(self.status_code())
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses() {
        assert_eq!(AppError::NoDocument.error_code(), "NO_DOCUMENT");
        assert_eq!(AppError::NoDocument.status_code(), StatusCode::CONFLICT);

        let ingest = AppError::Ingest(RagError::EmptyIndex);
        assert_eq!(ingest.error_code(), "INGEST_FAILED");
        assert_eq!(ingest.category(), "Ingestion error");

        let empty_q = AppError::Query(ContextorError::EmptyQuestion);
        assert_eq!(empty_q.status_code(), StatusCode::BAD_REQUEST);

        let upstream = AppError::Query(ContextorError::Completion("timeout".into()));
        assert_eq!(upstream.error_code(), "QUERY_FAILED");
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.to_string(), "completion error: timeout");
    }
}
