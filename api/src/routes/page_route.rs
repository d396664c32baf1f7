use axum::{extract::State, response::Html};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    core::app_state::AppState,
    routes::session_for,
    ui::page::{self, PageView},
};

/// `GET /`
pub async fn index_page(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (session, jar) = session_for(&state, jar);
    let view = {
        let mut ctx = session.ctx.lock().await;
        PageView::from_session(&mut ctx)
    };
    (jar, Html(page::render(&view)))
}
