//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` creates an `AppState` whose session authority signs
//! with the fixed test key and talks to an `InMemoryIdentityProvider`.

use std::sync::Arc;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::session_authority::SessionAuthority,
    domain::entities::service_credentials::{CredentialSource, ResolvedCredentials},
    test_utils::{InMemoryIdentityProvider, TEST_PROJECT_ID, create_test_config, test_credentials},
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let (app_state, provider) = TestAppStateBuilder::new()
///     .with_proof("proof-u1", "U1", Some("u1@example.com"))
///     .build_with_provider();
/// ```
pub struct TestAppStateBuilder {
    provider: InMemoryIdentityProvider,
    allow_localhost: bool,
    credential_source: CredentialSource,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            provider: InMemoryIdentityProvider::new(),
            allow_localhost: false,
            credential_source: CredentialSource::Inline,
        }
    }

    /// Accept `token` as a proof-of-identity token for `uid`.
    pub fn with_proof(mut self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.provider = self.provider.with_proof(token, uid, email);
        self
    }

    /// Allow loopback origins (development mode).
    pub fn with_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self
    }

    /// Start from bare credentials, as a misconfigured deployment would.
    pub fn without_signing_key(mut self) -> Self {
        self.credential_source = CredentialSource::Bare;
        self
    }

    /// Ambient platform credentials: no private key, sessions minted upstream.
    pub fn with_ambient_credentials(mut self) -> Self {
        self.credential_source = CredentialSource::Ambient;
        self
    }

    /// Build the AppState and return the provider for test assertions.
    pub fn build_with_provider(self) -> (AppState, Arc<InMemoryIdentityProvider>) {
        let config = create_test_config(|c| c.allow_localhost = self.allow_localhost);
        let credentials = match self.credential_source {
            CredentialSource::Bare => ResolvedCredentials::bare(None),
            CredentialSource::Ambient => ResolvedCredentials {
                source: CredentialSource::Ambient,
                project_id: Some(TEST_PROJECT_ID.to_string()),
                service_account: None,
            },
            CredentialSource::Inline | CredentialSource::File => test_credentials(),
        };

        let provider = Arc::new(self.provider);
        let authority =
            SessionAuthority::new(config.session_settings(), credentials, provider.clone());

        let app_state = AppState {
            config: Arc::new(config),
            session_authority: Arc::new(authority),
        };
        (app_state, provider)
    }

    pub fn build(self) -> AppState {
        self.build_with_provider().0
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
