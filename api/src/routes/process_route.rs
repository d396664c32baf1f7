use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::ApiResponse,
        qa_flow::{self, ProcessOutcome},
        session::{Notice, SessionContext},
    },
    error_handler::AppResult,
    routes::session_for,
    ui::page::SUCCESS_TEXT,
};

/// Runs with the session lock held by the caller.
async fn run(
    state: &AppState,
    ctx: &mut SessionContext,
    multipart: Multipart,
) -> AppResult<ProcessOutcome> {
    let upload = qa_flow::read_upload(multipart).await?;
    qa_flow::process_document(state, ctx, upload).await
}

/// `POST /process` from the page form; always redirects back to `/`.
#[instrument(skip_all)]
pub async fn process_form(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> (CookieJar, Redirect) {
    let (session, jar) = session_for(&state, jar);
    let mut ctx = session.ctx.lock().await;
    let notice = match run(&state, &mut ctx, multipart).await {
        Ok(_) => Notice::Success(SUCCESS_TEXT.into()),
        Err(e) => {
            error!(session = %session.id, code = e.error_code(), error = %e, "processing failed");
            Notice::Error {
                category: e.category(),
                message: e.to_string(),
            }
        }
    };
    ctx.notice = Some(notice);
    (jar, Redirect::to("/"))
}

/// `POST /api/process`
#[instrument(skip_all)]
pub async fn process_api(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> (CookieJar, Response) {
    let (session, jar) = session_for(&state, jar);
    let mut ctx = session.ctx.lock().await;
    let res = match run(&state, &mut ctx, multipart).await {
        Ok(outcome) => ApiResponse::success(outcome).into_response(),
        Err(e) => {
            error!(session = %session.id, code = e.error_code(), error = %e, "processing failed");
            e.into_response()
        }
    };
    (jar, res)
}
