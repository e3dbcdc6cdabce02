use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::{
    adapters::http::app_state::AppState,
    domain::entities::service_credentials::CredentialSource,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    credential_source: CredentialSource,
    signing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_fingerprint: Option<String>,
}

/// GET /api/health
/// Credential diagnostics without secret material.
async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    let authority = &app_state.session_authority;
    Json(HealthResponse {
        status: "ok",
        credential_source: authority.credential_source(),
        signing: authority.can_sign(),
        key_fingerprint: authority.key_fingerprint(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}
