use serde::Deserialize;

/// Body of `POST /ask` (form) and `POST /api/ask` (JSON).
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}
