use super::common::*;

/// POST /api/session/login
/// Exchanges a proof-of-identity token for the shared session cookie.
/// A rejected proof is a soft failure (200 + `success: false`); only a
/// missing `idToken` is a 400.
pub(super) async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let id_token = payload
        .id_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("idToken is required".into()))?;

    let authority = &app_state.session_authority;
    let settings = authority.settings();
    let mut headers = HeaderMap::new();

    match authority
        .issue_session_from_proof(id_token, settings.session_ttl)
        .await
    {
        Ok(issued) => {
            append_cookie(&mut headers, session_cookie(settings, issued.cookie_value))?;
            Ok((headers, Json(LoginResponse::signed_in(&issued.identity))))
        }
        Err(e) => {
            warn!(reason = e.reason(), error = %e, "Login rejected");
            Ok((headers, Json(LoginResponse::soft_failure(e.reason()))))
        }
    }
}
