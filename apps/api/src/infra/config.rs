use std::net::SocketAddr;
use std::path::PathBuf;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;

use crate::application::helpers::origin_policy::{cookie_domain_for, normalize_root_domain};
use crate::application::use_cases::session_authority::SessionSettings;

/// Custom sign-in tokens are capped at one hour by the identity provider.
pub const MAX_CUSTOM_TOKEN_TTL_SECS: i64 = 3600;

/// Inputs for credential resolution, highest priority first.
#[derive(Debug, Default)]
pub struct CredentialConfig {
    /// Inline service-identity JSON.
    pub inline_json: Option<SecretString>,
    /// Path to a service-identity JSON file.
    pub credentials_file: Option<PathBuf>,
    /// Running on a platform that serves credentials from a metadata server.
    pub ambient: bool,
    /// Explicit project id. Falls back to the one inside the key file.
    pub project_id: Option<String>,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// The property's root domain (e.g., "example.com").
    pub root_domain: String,
    pub cookie_name: String,
    /// Defaults to the root domain with a leading dot so every subdomain shares the cookie.
    pub cookie_domain: String,
    pub session_ttl: Duration,
    /// Development only: also allow loopback origins on any port.
    pub allow_localhost: bool,
    pub credentials: CredentialConfig,
    pub custom_token_ttl_secs: i64,
    pub provider_timeout: std::time::Duration,
    /// Optional JSON log file.
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let root_domain = normalize_root_domain(&get_env::<String>("ROOT_DOMAIN"));
        let cookie_name: String = get_env_default("SESSION_COOKIE_NAME", "session".to_string());
        let cookie_domain: String =
            get_env_default("SESSION_COOKIE_DOMAIN", cookie_domain_for(&root_domain));
        let session_ttl_days: i64 = get_env_default("SESSION_TTL_DAYS", 14);
        // Default to false - loopback origins must be explicitly enabled for local development
        let allow_localhost: bool = get_env_default("ALLOW_LOCALHOST_ORIGINS", false);

        let inline_json = std::env::var("SERVICE_ACCOUNT_JSON")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| SecretString::new(s.into()));
        let credentials_file = std::env::var("GOOGLE_APPLICATION_CREDENTIALS")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let ambient =
            std::env::var("K_SERVICE").is_ok() || std::env::var("FUNCTION_TARGET").is_ok();
        let project_id = std::env::var("PROJECT_ID")
            .or_else(|_| std::env::var("GOOGLE_CLOUD_PROJECT"))
            .ok()
            .filter(|s| !s.trim().is_empty());

        let custom_token_ttl_secs: i64 = get_env_default("CUSTOM_TOKEN_TTL_SECS", 3600);
        let provider_timeout_secs: u64 = get_env_default("PROVIDER_TIMEOUT_SECS", 5);
        let log_file = std::env::var("LOG_FILE").ok();

        Self {
            bind_addr,
            root_domain,
            cookie_name,
            cookie_domain,
            session_ttl: Duration::days(session_ttl_days),
            allow_localhost,
            credentials: CredentialConfig {
                inline_json,
                credentials_file,
                ambient,
                project_id,
            },
            custom_token_ttl_secs: custom_token_ttl_secs.clamp(1, MAX_CUSTOM_TOKEN_TTL_SECS),
            provider_timeout: std::time::Duration::from_secs(provider_timeout_secs.max(1)),
            log_file,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            root_domain: self.root_domain.clone(),
            cookie_name: self.cookie_name.clone(),
            cookie_domain: self.cookie_domain.clone(),
            session_ttl: self.session_ttl,
            allow_localhost: self.allow_localhost,
        }
    }
}
