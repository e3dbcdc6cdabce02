//! Shared imports and cookie utilities for the session routes.

// Core framework - re-exported for use by sibling modules
pub use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
};
pub use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
pub use sessionbridge_types::{
    ExchangeResponse, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, StatusResponse,
};
pub use tracing::{debug, info, warn};

// App-level imports
pub use crate::adapters::http::app_state::AppState;
pub use crate::app_error::{AppError, AppResult};
pub use crate::application::use_cases::session_authority::SessionSettings;

/// Appends a cookie to the headers, handling parse errors gracefully
pub(crate) fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> Result<(), AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("Failed to build cookie header".into()))?;
    headers.append("set-cookie", value);
    Ok(())
}

/// The shared session cookie, scoped to the root domain so every subdomain sees it.
pub(crate) fn session_cookie(settings: &SessionSettings, value: String) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .domain(settings.cookie_domain.clone())
        .path("/")
        .max_age(settings.session_ttl)
        .build()
}

/// Same attributes as `session_cookie`, empty and already expired.
pub(crate) fn clear_session_cookie(settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .domain(settings.cookie_domain.clone())
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build()
}

/// Raw session cookie value from the request, if any.
pub(crate) fn session_cookie_value<'a>(jar: &'a CookieJar, settings: &SessionSettings) -> Option<&'a str> {
    jar.get(&settings.cookie_name).map(|c| c.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_settings;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(&test_settings(), "abc".into());
        let header = cookie.to_string();

        assert!(header.starts_with("session=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Domain=root.tld"));
        assert!(header.contains("Path=/"));
        assert!(header.contains(&format!("Max-Age={}", 14 * 24 * 3600)));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let header = clear_session_cookie(&test_settings()).to_string();
        assert!(header.starts_with("session=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Domain=root.tld"));
    }
}
