//! Fixed key material and settings for deterministic tests.

use std::net::SocketAddr;

use secrecy::SecretString;
use sessionbridge_types::{CredentialCodec, KeyPair, SessionClaims};
use time::Duration;

use crate::{
    application::use_cases::session_authority::SessionSettings,
    domain::entities::service_credentials::{
        CredentialSource, ResolvedCredentials, ServiceAccountKey,
    },
    infra::config::{AppConfig, CredentialConfig},
};

pub const TEST_ROOT_DOMAIN: &str = "root.tld";
pub const TEST_PROJECT_ID: &str = "test-project";
pub const TEST_COOKIE_NAME: &str = "session";
pub const TEST_SIGNING_KEY_PEM: &str = include_str!("../../testdata/service_account_key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../../testdata/service_account_pub.pem");

/// Token endpoint that refuses connections, so no test reaches the network.
pub const TEST_OFFLINE_TOKEN_URI: &str = "http://127.0.0.1:9/token";

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        root_domain: TEST_ROOT_DOMAIN.to_string(),
        cookie_name: TEST_COOKIE_NAME.to_string(),
        cookie_domain: format!(".{TEST_ROOT_DOMAIN}"),
        session_ttl: Duration::days(14),
        allow_localhost: false,
    }
}

/// Inline credentials carrying the fixed test key.
pub fn test_credentials() -> ResolvedCredentials {
    ResolvedCredentials {
        source: CredentialSource::Inline,
        project_id: Some(TEST_PROJECT_ID.to_string()),
        service_account: Some(ServiceAccountKey {
            project_id: TEST_PROJECT_ID.to_string(),
            client_email: format!("svc@{TEST_PROJECT_ID}.iam.example"),
            private_key: SecretString::new(TEST_SIGNING_KEY_PEM.into()),
            token_uri: TEST_OFFLINE_TOKEN_URI.to_string(),
        }),
    }
}

/// A session cookie for `uid` signed with the test key, issued at `issued_at`.
pub fn test_session_cookie(uid: &str, issued_at: i64) -> String {
    let codec = CredentialCodec::new(Some(KeyPair::from_pkcs8_pem(TEST_SIGNING_KEY_PEM).unwrap()));
    let claims = SessionClaims::new(uid, None, false, issued_at, Duration::days(1).whole_seconds());
    codec.sign(&claims).unwrap()
}

/// Create a test config with sensible defaults.
pub fn create_test_config(overrides: impl FnOnce(&mut AppConfig)) -> AppConfig {
    let settings = test_settings();
    let mut config = AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        root_domain: settings.root_domain,
        cookie_name: settings.cookie_name,
        cookie_domain: settings.cookie_domain,
        session_ttl: settings.session_ttl,
        allow_localhost: settings.allow_localhost,
        credentials: CredentialConfig::default(),
        custom_token_ttl_secs: 3600,
        provider_timeout: std::time::Duration::from_secs(1),
        log_file: None,
    };
    overrides(&mut config);
    config
}
