use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub sessions: usize,
    pub generation_model: String,
    pub embedding_model: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        sessions: state.sessions.len(),
        generation_model: state.cfg.generation.model.clone(),
        embedding_model: state.cfg.embedding.model.clone(),
    })
}
