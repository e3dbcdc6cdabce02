pub mod health;
pub mod session;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/session", session::router())
        .nest("/health", health::router())
}
