use super::common::*;

/// POST /api/session/exchange
/// Trades the shared cookie for a one-time custom sign-in token the client
/// SDK can redeem. The token is only present when the cookie resolves.
pub(super) async fn exchange(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let authority = &app_state.session_authority;
    let cookie = session_cookie_value(&jar, authority.settings());

    let session = match authority.resolve_identity(cookie).await {
        Ok(session) => session,
        Err(e) => {
            debug!(reason = e.reason(), "Exchange unauthenticated");
            return Json(ExchangeResponse::unauthenticated());
        }
    };

    // The session itself is valid; a minting failure only means the client
    // cannot adopt it locally this time.
    let custom_token = match authority.mint_short_lived_sign_in_token(&session).await {
        Ok(token) => Some(token),
        Err(e) => {
            warn!(uid = %session.uid(), error = %e, "Custom token mint failed");
            None
        }
    };

    Json(ExchangeResponse::authenticated(&session.identity(), custom_token))
}
