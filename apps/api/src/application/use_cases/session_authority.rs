//! The session authority: single source of truth for "is there a valid
//! domain-wide session, and who does it belong to".
//!
//! Constructed once at startup and shared with every handler through
//! `AppState`. Its only mutable state is the key material, built by
//! `initialize()` exactly once.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use sessionbridge_types::{CredentialCodec, KeyPair, SessionClaims, SessionIdentity};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};

use crate::app_error::{AppError, AppResult};
use crate::application::helpers::origin_policy::OriginPolicy;
use crate::application::ports::identity_provider::{IdentityProvider, ProviderError};
use crate::domain::entities::service_credentials::{CredentialSource, ResolvedCredentials};

/// Cookie policy and domain settings for the shared session credential.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub root_domain: String,
    pub cookie_name: String,
    pub cookie_domain: String,
    pub session_ttl: Duration,
    pub allow_localhost: bool,
}

/// Key material derived from the resolved credentials.
#[derive(Debug)]
pub struct AuthorityKeys {
    codec: CredentialCodec,
}

impl AuthorityKeys {
    pub fn can_sign(&self) -> bool {
        self.codec.can_sign()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.codec.keys().map(KeyPair::fingerprint)
    }
}

/// A freshly minted session credential and the identity it is bound to.
#[derive(Debug)]
pub struct IssuedSession {
    pub cookie_value: String,
    pub identity: SessionIdentity,
}

/// A session credential that verified in the current request.
///
/// Only `resolve_identity` can construct one, so holding it proves the
/// cookie resolved before a sign-in token is minted.
#[derive(Debug)]
pub struct ResolvedSession {
    claims: SessionClaims,
}

impl ResolvedSession {
    pub fn uid(&self) -> &str {
        &self.claims.uid
    }

    pub fn identity(&self) -> SessionIdentity {
        self.claims.identity()
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }
}

pub struct SessionAuthority {
    settings: SessionSettings,
    origin_policy: OriginPolicy,
    credentials: ResolvedCredentials,
    provider: Arc<dyn IdentityProvider>,
    keys: OnceCell<AuthorityKeys>,
}

impl SessionAuthority {
    pub fn new(
        settings: SessionSettings,
        credentials: ResolvedCredentials,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let origin_policy = OriginPolicy::new(&settings.root_domain, settings.allow_localhost);
        Self {
            settings,
            origin_policy,
            credentials,
            provider,
            keys: OnceCell::new(),
        }
    }

    /// Build the key material from the resolved credentials.
    ///
    /// Idempotent: the first successful call does the work, later calls
    /// return the same keys. A failed call leaves nothing behind, so the next
    /// caller simply retries.
    pub fn initialize(&self) -> AppResult<&AuthorityKeys> {
        self.keys.get_or_try_init(|| -> AppResult<AuthorityKeys> {
            let keys = match self.credentials.private_key_pem() {
                Some(pem) => Some(KeyPair::from_pkcs8_pem(pem)?),
                None => None,
            };
            let keys = AuthorityKeys {
                codec: CredentialCodec::new(keys),
            };

            info!(
                source = %self.credentials.source,
                signing = keys.can_sign(),
                key_fingerprint = keys.fingerprint().unwrap_or("none"),
                "Session authority initialized"
            );
            Ok(keys)
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.origin_policy
    }

    pub fn credential_source(&self) -> CredentialSource {
        self.credentials.source
    }

    pub fn can_sign(&self) -> bool {
        self.initialize().map(AuthorityKeys::can_sign).unwrap_or(false)
    }

    pub fn key_fingerprint(&self) -> Option<String> {
        self.initialize()
            .ok()
            .and_then(AuthorityKeys::fingerprint)
            .map(str::to_string)
    }

    /// CORS gate: root domain or a direct subdomain over https, or loopback in dev.
    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.origin_policy.is_allowed(origin)
    }

    /// Verify a proof-of-identity token and mint a session credential for it.
    ///
    /// With a local signing key the credential is signed here; ambient
    /// deployments have the identity provider mint it instead. A proof from
    /// before an upstream revocation is refused either way.
    #[instrument(skip_all)]
    pub async fn issue_session_from_proof(
        &self,
        proof_token: &str,
        ttl: Duration,
    ) -> AppResult<IssuedSession> {
        if ttl <= Duration::ZERO {
            return Err(AppError::InvalidInput("session ttl must be positive".into()));
        }

        let proof = self
            .provider
            .verify_proof_token(proof_token)
            .await
            .map_err(proof_error)?;

        self.check_revocation(&proof.uid, proof.authenticated_at())
            .await
            .map_err(|e| match e {
                AppError::Revoked => AppError::InvalidProof("proof predates revocation".into()),
                other => other,
            })?;

        let keys = self.initialize()?;
        if keys.can_sign() {
            let claims = SessionClaims::new(
                proof.uid,
                proof.email,
                proof.email_verified,
                now(),
                ttl.whole_seconds(),
            );
            let cookie_value = keys.codec.sign(&claims)?;

            info!(uid = %claims.uid, "Session issued");
            return Ok(IssuedSession {
                cookie_value,
                identity: claims.identity(),
            });
        }

        if !self.uses_provider_sessions() {
            return Err(AppError::Configuration("no signing key available".into()));
        }

        let cookie_value = self
            .provider
            .create_session_credential(proof_token, ttl.whole_seconds())
            .await
            .map_err(proof_error)?;
        let identity = SessionIdentity {
            uid: proof.uid,
            email: proof.email,
            email_verified: proof.email_verified,
        };

        info!(uid = %identity.uid, "Session issued by identity provider");
        Ok(IssuedSession {
            cookie_value,
            identity,
        })
    }

    /// Verify the session credential and return who it belongs to.
    ///
    /// Locally signed credentials are checked by the codec for structure,
    /// signature and expiry. Ambient deployments verify provider-minted
    /// credentials through the identity provider. Either way the provider
    /// then decides revocation; if it cannot be reached, the signature check
    /// stands on its own.
    #[instrument(skip_all)]
    pub async fn resolve_identity(&self, cookie_value: Option<&str>) -> AppResult<ResolvedSession> {
        let cookie_value = cookie_value
            .filter(|v| !v.is_empty())
            .ok_or(AppError::NoSession)?;

        let keys = self.initialize()?;
        let provider_minted = keys.codec.keys().is_none() && self.uses_provider_sessions();
        let (claims, authenticated_at) = if provider_minted {
            let proof = self
                .provider
                .verify_session_credential(cookie_value)
                .await
                .map_err(|e| match e {
                    ProviderError::Rejected(msg) => AppError::InvalidSession(msg),
                    ProviderError::UserNotFound => AppError::Revoked,
                    ProviderError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
                    ProviderError::NotConfigured(msg) => AppError::Configuration(msg),
                })?;
            if proof.expires_at <= now() {
                return Err(AppError::InvalidSession("session expired".into()));
            }
            let authenticated_at = proof.authenticated_at();
            let claims = SessionClaims {
                uid: proof.uid,
                email: proof.email,
                email_verified: proof.email_verified,
                iat: proof.issued_at,
                exp: proof.expires_at,
            };
            (claims, authenticated_at)
        } else {
            let claims: SessionClaims = keys.codec.verify_claims(cookie_value)?;
            let issued_at = claims.iat;
            (claims, issued_at)
        };

        self.check_revocation(&claims.uid, authenticated_at).await?;

        Ok(ResolvedSession { claims })
    }

    /// Ambient platform credentials carry no private key, so sessions are
    /// minted and verified by the identity provider.
    fn uses_provider_sessions(&self) -> bool {
        self.credentials.source == CredentialSource::Ambient
    }

    /// Ask the provider whether anything authenticated at `authenticated_at`
    /// has since been revoked. An unreachable provider does not block.
    async fn check_revocation(&self, uid: &str, authenticated_at: i64) -> AppResult<()> {
        match self.provider.session_validity(uid).await {
            Ok(validity) if validity.revokes(authenticated_at) => {
                info!(uid = %uid, "Session revoked upstream");
                Err(AppError::Revoked)
            }
            Ok(_) => Ok(()),
            Err(ProviderError::UserNotFound) => {
                info!(uid = %uid, "Session user no longer exists");
                Err(AppError::Revoked)
            }
            Err(e) => {
                debug!(uid = %uid, error = %e, "Revocation check unavailable, using signature check alone");
                Ok(())
            }
        }
    }

    /// Mint a one-time custom sign-in token for a session resolved in this request.
    #[instrument(skip_all, fields(uid = %session.uid()))]
    pub async fn mint_short_lived_sign_in_token(
        &self,
        session: &ResolvedSession,
    ) -> AppResult<String> {
        self.provider
            .mint_custom_token(session.uid())
            .await
            .map_err(|e| match e {
                ProviderError::NotConfigured(msg) => AppError::Configuration(msg),
                ProviderError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
                other => AppError::Internal(other.to_string()),
            })
    }

    /// Invalidate every session of the resolved identity at the provider.
    #[instrument(skip_all, fields(uid = %session.uid()))]
    pub async fn revoke_sessions(&self, session: &ResolvedSession) -> AppResult<()> {
        self.provider
            .revoke_sessions(session.uid())
            .await
            .map_err(|e| match e {
                ProviderError::NotConfigured(msg) => AppError::Configuration(msg),
                ProviderError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
                other => {
                    warn!(error = %other, "Session revocation rejected");
                    AppError::Internal(other.to_string())
                }
            })?;
        info!("All sessions revoked");
        Ok(())
    }
}

/// Provider failures while turning a proof into a session.
fn proof_error(e: ProviderError) -> AppError {
    match e {
        ProviderError::Rejected(msg) => AppError::InvalidProof(msg),
        ProviderError::UserNotFound => AppError::InvalidProof("unknown user".into()),
        ProviderError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
        ProviderError::NotConfigured(msg) => AppError::Configuration(msg),
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
