use serde::{Deserialize, Serialize};

use crate::SessionIdentity;

/// Body of `POST /login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Proof-of-identity token from the identity provider's client SDK.
    pub id_token: Option<String>,
}

/// Response of `POST /login`.
///
/// A rejected proof is a soft failure: HTTP 200 with `success: false` and a
/// machine-readable `reason`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LoginResponse {
    pub fn signed_in(identity: &SessionIdentity) -> Self {
        Self {
            success: true,
            uid: Some(identity.uid.clone()),
            email: identity.email.clone(),
            email_verified: Some(identity.email_verified),
            reason: None,
        }
    }

    pub fn soft_failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Response of `GET /status`. Never an error for the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl StatusResponse {
    pub fn unauthenticated() -> Self {
        Self {
            success: true,
            authenticated: false,
            ..Default::default()
        }
    }

    pub fn authenticated(identity: &SessionIdentity) -> Self {
        Self {
            success: true,
            authenticated: true,
            uid: Some(identity.uid.clone()),
            email: identity.email.clone(),
            email_verified: Some(identity.email_verified),
        }
    }
}

/// Response of `POST /exchange`.
///
/// `custom_token` is only present when `authenticated` is true.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub success: bool,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_token: Option<String>,
}

impl ExchangeResponse {
    pub fn unauthenticated() -> Self {
        Self {
            success: true,
            authenticated: false,
            ..Default::default()
        }
    }

    pub fn authenticated(identity: &SessionIdentity, custom_token: Option<String>) -> Self {
        Self {
            success: true,
            authenticated: true,
            uid: Some(identity.uid.clone()),
            email: identity.email.clone(),
            email_verified: Some(identity.email_verified),
            custom_token,
        }
    }
}

/// Optional body of `POST /logout`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Also revoke every upstream session for the identity.
    #[serde(default)]
    pub everywhere: bool,
}

/// Response of `POST /logout`. Always `success: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}
