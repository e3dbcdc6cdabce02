use axum::body::Bytes;

use super::common::*;

/// POST /api/session/logout
/// Always clears the shared cookie and reports success, with or without a
/// valid session. An optional `{"everywhere": true}` body also revokes every
/// upstream session of the cookie's identity, best-effort.
pub(super) async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let authority = &app_state.session_authority;
    let settings = authority.settings();

    // The body is optional and never a reason to refuse a logout.
    let request: LogoutRequest = serde_json::from_slice(&body).unwrap_or_default();

    if request.everywhere {
        match authority
            .resolve_identity(session_cookie_value(&jar, settings))
            .await
        {
            Ok(session) => {
                if let Err(e) = authority.revoke_sessions(&session).await {
                    warn!(uid = %session.uid(), error = %e, "Upstream revocation failed");
                }
            }
            Err(e) => debug!(reason = e.reason(), "Nothing to revoke"),
        }
    }

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, clear_session_cookie(settings))?;
    info!("Session cookie cleared");

    Ok((headers, Json(LogoutResponse { success: true })))
}
