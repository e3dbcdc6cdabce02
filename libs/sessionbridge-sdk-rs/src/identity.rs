//! The two collaborators the state machine drives: the session endpoints and
//! the subdomain's own identity SDK instance.

use async_trait::async_trait;
use sessionbridge_types::{ExchangeResponse, LoginResponse, LogoutResponse, StatusResponse};

use crate::error::SdkError;

/// The token exchange endpoints, as seen from one subdomain.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Trade the shared cookie for a custom sign-in token.
    async fn exchange(&self) -> Result<ExchangeResponse, SdkError>;

    /// Trade a proof-of-identity token for the shared cookie.
    async fn login(&self, id_token: &str) -> Result<LoginResponse, SdkError>;

    async fn status(&self) -> Result<StatusResponse, SdkError>;

    /// Clear the shared cookie, optionally revoking every upstream session.
    async fn logout(&self, everywhere: bool) -> Result<LogoutResponse, SdkError>;
}

/// The user signed in to this subdomain's local identity SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub uid: String,
    pub email: Option<String>,
}

/// This subdomain's identity SDK instance, bound to its own origin storage.
#[async_trait]
pub trait LocalIdentity: Send + Sync {
    async fn current_user(&self) -> Option<LocalUser>;

    async fn sign_out(&self) -> Result<(), SdkError>;

    /// Redeem a custom sign-in token minted by the exchange endpoint.
    async fn sign_in_with_custom_token(&self, token: &str) -> Result<LocalUser, SdkError>;

    /// A fresh proof-of-identity token for the current user.
    async fn id_token(&self) -> Result<String, SdkError>;
}
