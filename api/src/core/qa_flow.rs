//! The two user operations: process a document, ask a question.
//!
//! Both run against one locked [`SessionContext`]; callers hold the session
//! mutex for the whole operation.

use std::sync::Arc;

use axum::extract::Multipart;
use contextor::{QaAnswer, build_query_engine};
use rag_store::{IndexStats, Upload};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    core::{app_state::AppState, session::SessionContext},
    error_handler::{AppError, AppResult},
};

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ProcessOutcome {
    /// `None` when the default data folder was indexed.
    pub file_name: Option<String>,
    pub stats: IndexStats,
}

/// Reads the `file` field. A browser form submitted with no file selected
/// sends an empty part with an empty name; that counts as no upload.
pub async fn read_upload(mut multipart: Multipart) -> AppResult<Option<Upload>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }
        if file_name.is_empty() {
            return Err(AppError::BadRequest("uploaded file has no name".into()));
        }
        upload = Some(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Ok(upload)
}

/// Ingests `upload` (or the data folder), builds a fresh index and installs
/// its engine in the session, replacing any previous one.
///
/// On failure the session keeps its previous engine.
pub async fn process_document(
    state: &AppState,
    ctx: &mut SessionContext,
    upload: Option<Upload>,
) -> AppResult<ProcessOutcome> {
    let file_name = upload.as_ref().map(|u| u.file_name.clone());

    let docs = state
        .store
        .load_documents(upload)
        .await
        .map_err(AppError::Ingest)?;

    let (engine, stats) =
        build_query_engine(&state.store, &docs, &state.providers, state.cfg.query)
            .await
            .map_err(|e| {
                warn!(error = %e, "index build failed");
                AppError::Index(e)
            })?;

    info!(
        file = file_name.as_deref().unwrap_or("<data dir>"),
        documents = stats.documents,
        segments = stats.segments,
        elapsed_ms = stats.elapsed_ms as u64,
        "document processed"
    );

    ctx.engine = Some(Arc::new(engine));
    ctx.file_name = file_name.clone();
    ctx.last_question = None;
    ctx.last_answer = None;

    Ok(ProcessOutcome { file_name, stats })
}

/// Answers `question` with the session's engine.
pub async fn ask_question(
    ctx: &mut SessionContext,
    question: &str,
) -> AppResult<QaAnswer> {
    let engine = ctx.engine.clone().ok_or(AppError::NoDocument)?;
    let answer = engine.query(question).await.map_err(AppError::Query)?;

    ctx.last_question = Some(question.trim().to_string());
    ctx.last_answer = Some(answer.clone());
    Ok(answer)
}
