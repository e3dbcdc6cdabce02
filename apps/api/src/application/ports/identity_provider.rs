//! Identity provider port.
//!
//! The session authority talks to the external identity provider only through
//! this trait. The production adapter lives in `infra::identity_toolkit`;
//! tests use the in-memory mock from `test_utils`.

use async_trait::async_trait;
use thiserror::Error;

/// Claims extracted from a token the provider signed: a proof-of-identity
/// token or a provider-minted session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofClaims {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    /// When the user actually authenticated (Unix timestamp), if reported.
    pub auth_time: Option<i64>,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl ProofClaims {
    /// The moment upstream revocation is compared against.
    pub fn authenticated_at(&self) -> i64 {
        self.auth_time.unwrap_or(self.issued_at)
    }
}

/// Upstream view of whether sessions for a uid are still honoured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionValidity {
    /// Sessions issued before this Unix timestamp are revoked.
    pub valid_since: Option<i64>,
    pub disabled: bool,
}

impl SessionValidity {
    /// True if a credential issued at `issued_at` must be rejected.
    pub fn revokes(&self, issued_at: i64) -> bool {
        self.disabled || self.valid_since.is_some_and(|since| issued_at < since)
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider looked at the input and said no.
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("User not found")]
    UserNotFound,

    /// Network failure, timeout, or an upstream 5xx.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The operation needs credentials this process does not have.
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a proof-of-identity token minted by the provider's client SDK.
    async fn verify_proof_token(&self, token: &str) -> Result<ProofClaims, ProviderError>;

    /// Revocation-aware lookup of the account behind `uid`.
    async fn session_validity(&self, uid: &str) -> Result<SessionValidity, ProviderError>;

    /// Invalidate every session issued so far for `uid`.
    async fn revoke_sessions(&self, uid: &str) -> Result<(), ProviderError>;

    /// Mint a one-time custom sign-in token the client SDK can redeem.
    async fn mint_custom_token(&self, uid: &str) -> Result<String, ProviderError>;

    /// Have the provider mint a session credential from a proof token.
    /// Used when this process holds no signing key of its own.
    async fn create_session_credential(
        &self,
        proof_token: &str,
        ttl_secs: i64,
    ) -> Result<String, ProviderError>;

    /// Verify a session credential minted by `create_session_credential`.
    async fn verify_session_credential(&self, credential: &str)
    -> Result<ProofClaims, ProviderError>;
}
