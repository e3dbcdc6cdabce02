//! In-memory identity provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use time::OffsetDateTime;

use crate::application::ports::identity_provider::{
    IdentityProvider, ProofClaims, ProviderError, SessionValidity,
};

// ============================================================================
// InMemoryIdentityProvider
// ============================================================================

/// Proof tokens are looked up verbatim; revocation state lives in a map.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    pub proofs: Mutex<HashMap<String, ProofClaims>>,
    pub validity: Mutex<HashMap<String, SessionValidity>>,
    pub unavailable: Mutex<bool>,
    pub mint_disabled: Mutex<bool>,
    pub minted: Mutex<Vec<String>>,
    pub revoked: Mutex<Vec<String>>,
    pub sessions: Mutex<HashMap<String, ProofClaims>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as proof of identity for `uid`, signed in a minute ago.
    pub fn with_proof(self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.add_proof(token, uid, email, now() - 60);
        self
    }

    /// Accept `token` as proof that `uid` authenticated at `auth_time`.
    pub fn add_proof(&self, token: &str, uid: &str, email: Option<&str>, auth_time: i64) {
        self.proofs.lock().unwrap().insert(
            token.to_string(),
            ProofClaims {
                uid: uid.to_string(),
                email: email.map(str::to_string),
                email_verified: email.is_some(),
                auth_time: Some(auth_time),
                issued_at: auth_time,
                expires_at: auth_time + 3600,
            },
        );
        self.validity
            .lock()
            .unwrap()
            .entry(uid.to_string())
            .or_default();
    }

    /// Simulate a network outage on every call.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// Simulate a deployment without a service identity key.
    pub fn set_mint_disabled(&self, disabled: bool) {
        *self.mint_disabled.lock().unwrap() = disabled;
    }

    /// Invalidate every session issued before the current second, the way
    /// `accounts:update` with `validSince = now` does.
    pub fn revoke_all(&self, uid: &str) {
        let since = now();
        self.validity
            .lock()
            .unwrap()
            .entry(uid.to_string())
            .or_default()
            .valid_since = Some(since);
    }

    pub fn disable(&self, uid: &str) {
        self.validity
            .lock()
            .unwrap()
            .entry(uid.to_string())
            .or_default()
            .disabled = true;
    }

    pub fn delete_user(&self, uid: &str) {
        self.validity.lock().unwrap().remove(uid);
    }

    pub fn minted_for(&self) -> Vec<String> {
        self.minted.lock().unwrap().clone()
    }

    pub fn revoked_for(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if *self.unavailable.lock().unwrap() {
            return Err(ProviderError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn verify_proof_token(&self, token: &str) -> Result<ProofClaims, ProviderError> {
        self.check_available()?;
        self.proofs
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("unknown proof token".into()))
    }

    async fn session_validity(&self, uid: &str) -> Result<SessionValidity, ProviderError> {
        self.check_available()?;
        self.validity
            .lock()
            .unwrap()
            .get(uid)
            .copied()
            .ok_or(ProviderError::UserNotFound)
    }

    async fn revoke_sessions(&self, uid: &str) -> Result<(), ProviderError> {
        self.check_available()?;
        self.revoke_all(uid);
        self.revoked.lock().unwrap().push(uid.to_string());
        Ok(())
    }

    async fn mint_custom_token(&self, uid: &str) -> Result<String, ProviderError> {
        self.check_available()?;
        if *self.mint_disabled.lock().unwrap() {
            return Err(ProviderError::NotConfigured("no service identity key".into()));
        }
        self.minted.lock().unwrap().push(uid.to_string());
        Ok(format!("custom-token-for-{uid}"))
    }

    async fn create_session_credential(
        &self,
        proof_token: &str,
        ttl_secs: i64,
    ) -> Result<String, ProviderError> {
        let mut claims = self.verify_proof_token(proof_token).await?;
        let now = now();
        claims.issued_at = now;
        claims.expires_at = now + ttl_secs;

        let mut sessions = self.sessions.lock().unwrap();
        let credential = format!("provider-session-{}-{}", claims.uid, sessions.len());
        sessions.insert(credential.clone(), claims);
        Ok(credential)
    }

    async fn verify_session_credential(
        &self,
        credential: &str,
    ) -> Result<ProofClaims, ProviderError> {
        self.check_available()?;
        self.sessions
            .lock()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("unknown session credential".into()))
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
