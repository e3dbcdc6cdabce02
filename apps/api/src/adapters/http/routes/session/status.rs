use super::common::*;

/// GET /api/session/status
/// Reports whether the shared cookie holds a live session. Never errors:
/// absent, malformed, expired and revoked cookies all read as unauthenticated.
pub(super) async fn status(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let authority = &app_state.session_authority;
    let cookie = session_cookie_value(&jar, authority.settings());

    match authority.resolve_identity(cookie).await {
        Ok(session) => Json(StatusResponse::authenticated(&session.identity())),
        Err(e) => {
            debug!(reason = e.reason(), "Status check unauthenticated");
            Json(StatusResponse::unauthenticated())
        }
    }
}
