//! Token exchange endpoints: login, status, exchange, logout.
//!
//! Every handler is stateless and reaches the session authority through
//! `AppState`. Verification failures never become error statuses here; only
//! malformed requests do.

mod common;
mod exchange;
mod login;
mod logout;
mod status;

use common::*;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login::login))
        .route("/status", get(status::status))
        .route("/exchange", post(exchange::exchange))
        .route("/logout", post(logout::logout))
}
