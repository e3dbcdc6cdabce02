//! Identity provider adapter backed by the Google Identity Toolkit REST API.
//!
//! - Proof tokens are verified locally against the provider's published JWKS.
//! - Ambient deployments without a private key have the provider mint session
//!   cookies (`createSessionCookie`) and verify them against a second JWKS.
//! - Custom sign-in tokens are RS256 JWTs signed with the service identity key.
//! - Revocation state is read and written through `accounts:lookup` and
//!   `accounts:update`, authorized by an OAuth access token from either a
//!   JWT-bearer grant or the platform metadata server.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::application::ports::identity_provider::{
    IdentityProvider, ProofClaims, ProviderError, SessionValidity,
};
use crate::domain::entities::service_credentials::{CredentialSource, ResolvedCredentials};

const SECURE_TOKEN_ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const SESSION_COOKIE_ISSUER_PREFIX: &str = "https://session.firebase.google.com/";
const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";
const ACCESS_TOKEN_SCOPES: &str =
    "https://www.googleapis.com/auth/identitytoolkit https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const JWKS_TTL: Duration = Duration::from_secs(3600);
/// Minimum gap between refetches triggered by an unknown key id.
const JWKS_REFETCH_COOLDOWN: Duration = Duration::from_secs(60);
const ACCESS_TOKEN_MARGIN: Duration = Duration::from_secs(60);
const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;
const MAX_UID_LEN: usize = 128;

/// Upstream URLs, overridable for tests and emulators.
#[derive(Debug, Clone)]
pub struct IdentityToolkitEndpoints {
    pub jwks_url: String,
    pub session_jwks_url: String,
    pub api_base: String,
    pub metadata_token_url: String,
}

impl Default for IdentityToolkitEndpoints {
    fn default() -> Self {
        Self {
            jwks_url: "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com".into(),
            session_jwks_url: "https://identitytoolkit.googleapis.com/v1/sessionCookiePublicKeys".into(),
            api_base: "https://identitytoolkit.googleapis.com/v1".into(),
            metadata_token_url: "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token".into(),
        }
    }
}

/// Service identity material needed to sign custom tokens and grant assertions.
struct ServiceSigner {
    client_email: String,
    token_uri: String,
    key: EncodingKey,
}

#[derive(Default)]
struct JwksCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl JwksCache {
    fn is_fresh(&self) -> bool {
        self.fetched_at.is_some_and(|t| t.elapsed() < JWKS_TTL)
    }

    fn may_refetch(&self) -> bool {
        self.fetched_at
            .is_none_or(|t| t.elapsed() >= JWKS_REFETCH_COOLDOWN)
    }
}

/// Which provider key set a token is checked against.
#[derive(Debug, Clone, Copy)]
enum KeySet {
    ProofTokens,
    SessionCookies,
}

struct CachedAccessToken {
    token: String,
    expires_at: Instant,
}

pub struct IdentityToolkitProvider {
    client: Client,
    endpoints: IdentityToolkitEndpoints,
    project_id: Option<String>,
    signer: Option<ServiceSigner>,
    ambient: bool,
    custom_token_ttl_secs: i64,
    jwks: RwLock<JwksCache>,
    session_jwks: RwLock<JwksCache>,
    access_token: Mutex<Option<CachedAccessToken>>,
}

impl IdentityToolkitProvider {
    pub fn new(client: Client, credentials: &ResolvedCredentials, custom_token_ttl_secs: i64) -> Self {
        let signer = credentials.service_account.as_ref().and_then(|sa| {
            match EncodingKey::from_rsa_pem(credentials.private_key_pem()?.as_bytes()) {
                Ok(key) => Some(ServiceSigner {
                    client_email: sa.client_email.clone(),
                    token_uri: sa.token_uri.clone(),
                    key,
                }),
                Err(e) => {
                    warn!(error = %e, "Service identity key rejected; custom tokens unavailable");
                    None
                }
            }
        });

        Self {
            client,
            endpoints: IdentityToolkitEndpoints::default(),
            project_id: credentials.project_id.clone(),
            signer,
            ambient: credentials.source == CredentialSource::Ambient,
            custom_token_ttl_secs,
            jwks: RwLock::new(JwksCache::default()),
            session_jwks: RwLock::new(JwksCache::default()),
            access_token: Mutex::new(None),
        }
    }

    pub fn with_endpoints(mut self, endpoints: IdentityToolkitEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn project_id(&self) -> Result<&str, ProviderError> {
        self.project_id
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("no project id".into()))
    }

    // ========================================================================
    // Provider-signed tokens
    // ========================================================================

    fn key_source(&self, set: KeySet) -> (&str, &RwLock<JwksCache>) {
        match set {
            KeySet::ProofTokens => (&self.endpoints.jwks_url, &self.jwks),
            KeySet::SessionCookies => (&self.endpoints.session_jwks_url, &self.session_jwks),
        }
    }

    async fn decoding_key(&self, set: KeySet, kid: &str) -> Result<DecodingKey, ProviderError> {
        let (_, jwks) = self.key_source(set);
        {
            let cache = jwks.read().await;
            if cache.is_fresh()
                && let Some(key) = cache.keys.get(kid)
            {
                return Ok(key.clone());
            }
            if cache.is_fresh() && !cache.may_refetch() {
                return Err(ProviderError::Rejected(format!("unknown key id {kid}")));
            }
        }

        self.refresh_jwks(set).await?;

        jwks.read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected(format!("unknown key id {kid}")))
    }

    async fn refresh_jwks(&self, set: KeySet) -> Result<(), ProviderError> {
        let (url, jwks) = self.key_source(set);
        let mut cache = jwks.write().await;
        // Another request may have refreshed while we waited for the lock.
        if cache.fetched_at.is_some_and(|t| t.elapsed() < JWKS_REFETCH_COOLDOWN) {
            return Ok(());
        }

        let response: JwksResponse = send_json(self.client.get(url)).await?;

        let mut keys = HashMap::new();
        for jwk in response.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, error = %e, "Skipping malformed JWK"),
            }
        }

        debug!(count = keys.len(), key_set = ?set, "Refreshed provider signing keys");
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        Ok(())
    }

    /// Check signature, issuer, audience and subject of a provider-signed token.
    async fn verify_signed(
        &self,
        token: &str,
        set: KeySet,
        issuer_prefix: &str,
    ) -> Result<ProofClaims, ProviderError> {
        let project_id = self.project_id()?;

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| ProviderError::Rejected(format!("malformed token: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(ProviderError::Rejected("unexpected algorithm".into()));
        }
        let kid = header
            .kid
            .ok_or_else(|| ProviderError::Rejected("missing key id".into()))?;
        let key = self.decoding_key(set, &kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("{issuer_prefix}{project_id}")]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;

        let claims = jsonwebtoken::decode::<ProviderTokenClaims>(token, &key, &validation)
            .map_err(|e| ProviderError::Rejected(e.to_string()))?
            .claims;

        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(ProviderError::Rejected("invalid subject".into()));
        }
        if claims
            .auth_time
            .is_some_and(|t| t > now() + CLOCK_SKEW_LEEWAY_SECS as i64)
        {
            return Err(ProviderError::Rejected("auth_time in the future".into()));
        }

        Ok(ProofClaims {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            auth_time: claims.auth_time,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    #[cfg(test)]
    async fn insert_key(&self, set: KeySet, kid: &str, key: DecodingKey) {
        let (_, jwks) = self.key_source(set);
        let mut cache = jwks.write().await;
        cache.keys.insert(kid.to_string(), key);
        cache.fetched_at = Some(Instant::now());
    }

    // ========================================================================
    // Access tokens
    // ========================================================================

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now() + ACCESS_TOKEN_MARGIN
        {
            return Ok(token.token.clone());
        }

        let response: AccessTokenResponse = if let Some(signer) = &self.signer {
            let now = now();
            let assertion = GrantAssertion {
                iss: &signer.client_email,
                scope: ACCESS_TOKEN_SCOPES,
                aud: &signer.token_uri,
                iat: now,
                exp: now + 3600,
            };
            let assertion = sign_rs256(&assertion, &signer.key)?;
            send_json(
                self.client
                    .post(&signer.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)]),
            )
            .await?
        } else if self.ambient {
            send_json(
                self.client
                    .get(&self.endpoints.metadata_token_url)
                    .header("Metadata-Flavor", "Google"),
            )
            .await?
        } else {
            return Err(ProviderError::NotConfigured(
                "no credentials for provider API calls".into(),
            ));
        };

        let token = response.access_token;
        *cached = Some(CachedAccessToken {
            token: token.clone(),
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        });
        Ok(token)
    }

    /// POST to `{api_base}/projects/{project}{path}` with a bearer token.
    async fn call_api<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let project_id = self.project_id()?;
        let token = self.access_token().await?;
        let url = format!("{}/projects/{}{}", self.endpoints.api_base, project_id, path);
        send_json(self.client.post(url).bearer_auth(token).json(body)).await
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    async fn verify_proof_token(&self, token: &str) -> Result<ProofClaims, ProviderError> {
        self.verify_signed(token, KeySet::ProofTokens, SECURE_TOKEN_ISSUER_PREFIX)
            .await
    }

    async fn session_validity(&self, uid: &str) -> Result<SessionValidity, ProviderError> {
        let response: LookupResponse = self
            .call_api("/accounts:lookup", &serde_json::json!({ "localId": [uid] }))
            .await?;

        let user = response
            .users
            .into_iter()
            .next()
            .ok_or(ProviderError::UserNotFound)?;

        Ok(SessionValidity {
            valid_since: user.valid_since.and_then(|s| s.parse().ok()),
            disabled: user.disabled,
        })
    }

    async fn revoke_sessions(&self, uid: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call_api(
                "/accounts:update",
                &serde_json::json!({ "localId": uid, "validSince": now().to_string() }),
            )
            .await?;
        Ok(())
    }

    async fn mint_custom_token(&self, uid: &str) -> Result<String, ProviderError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("custom tokens need a service identity key".into())
        })?;

        let iat = now();
        let claims = CustomTokenClaims {
            iss: &signer.client_email,
            sub: &signer.client_email,
            aud: CUSTOM_TOKEN_AUDIENCE,
            iat,
            exp: iat + self.custom_token_ttl_secs,
            uid,
        };
        sign_rs256(&claims, &signer.key)
    }

    async fn create_session_credential(
        &self,
        proof_token: &str,
        ttl_secs: i64,
    ) -> Result<String, ProviderError> {
        let response: SessionCookieResponse = self
            .call_api(
                ":createSessionCookie",
                &serde_json::json!({
                    "idToken": proof_token,
                    "validDuration": ttl_secs.to_string(),
                }),
            )
            .await?;
        Ok(response.session_cookie)
    }

    async fn verify_session_credential(
        &self,
        credential: &str,
    ) -> Result<ProofClaims, ProviderError> {
        self.verify_signed(credential, KeySet::SessionCookies, SESSION_COOKIE_ISSUER_PREFIX)
            .await
    }
}

fn sign_rs256<T: Serialize>(claims: &T, key: &EncodingKey) -> Result<String, ProviderError> {
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, key)
        .map_err(|e| ProviderError::NotConfigured(format!("signing failed: {e}")))
}

/// Send a request and decode a JSON body, mapping transport and status failures.
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

    let status = response.status();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::Unavailable(format!("upstream status {status}")));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if body.contains("USER_NOT_FOUND") {
            return Err(ProviderError::UserNotFound);
        }
        return Err(ProviderError::Rejected(format!("upstream status {status}")));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::Unavailable(format!("unreadable response: {e}")))
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[derive(Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct ProviderTokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    auth_time: Option<i64>,
}

#[derive(Serialize)]
struct CustomTokenClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    uid: &'a str,
}

#[derive(Serialize)]
struct GrantAssertion<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCookieResponse {
    session_cookie: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    valid_since: Option<String>,
    #[serde(default)]
    disabled: bool,
}
