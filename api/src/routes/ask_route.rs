use axum::{
    Form, Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::ApiResponse,
        qa_flow,
        session::Notice,
    },
    error_handler::AppError,
    routes::{ask_request::AskRequest, session_for},
};

/// `POST /ask` from the page form; always redirects back to `/`.
#[instrument(skip_all)]
pub async fn ask_form(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<AskRequest>,
) -> (CookieJar, Redirect) {
    let (session, jar) = session_for(&state, jar);
    let mut ctx = session.ctx.lock().await;
    if let Err(e) = qa_flow::ask_question(&mut ctx, &req.question).await {
        error!(session = %session.id, code = e.error_code(), error = %e, "question failed");
        ctx.last_question = Some(req.question.trim().to_string());
        ctx.last_answer = None;
        ctx.notice = Some(Notice::Error {
            category: e.category(),
            message: e.to_string(),
        });
    }
    (jar, Redirect::to("/"))
}

/// `POST /api/ask`
#[instrument(skip_all)]
pub async fn ask_api(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> (CookieJar, Response) {
    let (session, jar) = session_for(&state, jar);
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rej) => return (jar, AppError::from(rej).into_response()),
    };

    let mut ctx = session.ctx.lock().await;
    let res = match qa_flow::ask_question(&mut ctx, &req.question).await {
        Ok(answer) => ApiResponse::success(answer).into_response(),
        Err(e) => {
            error!(session = %session.id, code = e.error_code(), error = %e, "question failed");
            e.into_response()
        }
    };
    (jar, res)
}
