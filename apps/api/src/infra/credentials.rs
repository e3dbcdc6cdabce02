//! Credential resolution for the session authority.
//!
//! Sources are tried in priority order: inline secret, file reference,
//! ambient platform credentials, bare fallback. A source that is present but
//! unusable is logged and skipped rather than aborting startup.

use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::domain::entities::service_credentials::{
    CredentialSource, ResolvedCredentials, ServiceAccountKey,
};
use crate::infra::config::CredentialConfig;

pub fn resolve(config: &CredentialConfig) -> ResolvedCredentials {
    if let Some(inline) = &config.inline_json {
        match ServiceAccountKey::from_json(inline.expose_secret()) {
            Ok(key) => return with_key(CredentialSource::Inline, key, config),
            Err(e) => warn!(error = %e, "Inline service identity unusable, trying next source"),
        }
    }

    if let Some(path) = &config.credentials_file {
        match std::fs::read_to_string(path) {
            Ok(json) => match ServiceAccountKey::from_json(&json) {
                Ok(key) => return with_key(CredentialSource::File, key, config),
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "Service identity file unusable, trying next source"
                ),
            },
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Service identity file unreadable, trying next source"
            ),
        }
    }

    if config.ambient {
        info!("Using ambient platform credentials; session signing is unavailable");
        return ResolvedCredentials {
            source: CredentialSource::Ambient,
            project_id: config.project_id.clone(),
            service_account: None,
        };
    }

    warn!("No service identity configured; session verification will fail");
    ResolvedCredentials::bare(config.project_id.clone())
}

fn with_key(
    source: CredentialSource,
    key: ServiceAccountKey,
    config: &CredentialConfig,
) -> ResolvedCredentials {
    let project_id = config
        .project_id
        .clone()
        .unwrap_or_else(|| key.project_id.clone());
    ResolvedCredentials {
        source,
        project_id: Some(project_id),
        service_account: Some(key),
    }
}
