pub mod ask_request;
pub mod ask_route;
pub mod health_route;
pub mod page_route;
pub mod process_route;

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::core::{
    app_state::AppState,
    session::{SESSION_COOKIE, Session},
};

/// Resolves the caller's session from the cookie jar, issuing a new cookie
/// when the session had to be created.
pub(crate) fn session_for(state: &AppState, jar: CookieJar) -> (Arc<Session>, CookieJar) {
    let id = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let (session, created) = state.sessions.get_or_create(id);
    if !created {
        return (session, jar);
    }
    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax);
    (session, jar.add(cookie))
}
