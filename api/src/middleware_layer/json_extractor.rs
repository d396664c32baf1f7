//! Rewrites axum's plain-text rejections on `/api/*` into the JSON envelope.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Rejection bodies are short; anything larger is left untouched.
const MAX_REJECTION_BYTES: usize = 64 * 1024;

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert(REQUEST_ID_HEADER, value);
    }
    id
}

fn detail_for(status: StatusCode, msg: &str) -> Option<ApiErrorDetail> {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return Some(ApiErrorDetail::hint(
            Some("file"),
            "The uploaded file exceeds MAX_UPLOAD_BYTES.",
        ));
    }
    if msg.contains("question") {
        return Some(ApiErrorDetail::hint(
            Some("question"),
            "Expected a JSON object like { \"question\": \"...\" }.",
        ));
    }
    if msg.contains("Content-Type") {
        return Some(ApiErrorDetail::hint(None, "Check the request Content-Type header."));
    }
    None
}

fn code_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        _ => "BAD_REQUEST",
    }
}

pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::PAYLOAD_TOO_LARGE
            | StatusCode::UNSUPPORTED_MEDIA_TYPE
            | StatusCode::UNPROCESSABLE_ENTITY
    ) {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let request_id = ensure_request_id(&mut parts);
    // Handlers already answer with the envelope.
    if is_json(&parts) {
        return Response::from_parts(parts, body);
    }

    let bytes = axum::body::to_bytes(body, MAX_REJECTION_BYTES)
        .await
        .unwrap_or_else(|_| Bytes::new());
    let original = String::from_utf8_lossy(&bytes);
    debug!(%status, %request_id, "rewriting rejection into envelope");

    let envelope = ApiResponse::<()>::error(
        code_for(status),
        original.trim(),
        detail_for(status, &original).into_iter().collect(),
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(body))
}
