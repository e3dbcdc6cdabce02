use std::fs::File;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::identity_provider::IdentityProvider,
        use_cases::session_authority::SessionAuthority,
    },
    infra::{
        config::AppConfig, credentials, error::InfraError, http_client::build_client,
        identity_toolkit::IdentityToolkitProvider,
    },
};

pub fn init_app_state(config: AppConfig) -> Result<AppState, InfraError> {
    let resolved = credentials::resolve(&config.credentials);

    let client = build_client(config.provider_timeout).map_err(InfraError::HttpClient)?;
    let provider: Arc<dyn IdentityProvider> = Arc::new(IdentityToolkitProvider::new(
        client,
        &resolved,
        config.custom_token_ttl_secs,
    ));

    let authority = SessionAuthority::new(config.session_settings(), resolved, provider);

    // Bad key material is reported here and again on each request that needs
    // it; the process still serves status and logout.
    match authority.initialize() {
        Ok(keys) if keys.can_sign() => info!(
            source = %authority.credential_source(),
            "Session signing enabled"
        ),
        Ok(_) => warn!(
            source = %authority.credential_source(),
            "No signing key; login and status will fail until credentials are configured"
        ),
        Err(e) => error!(error = %e, "Session authority failed to initialize"),
    }

    Ok(AppState {
        config: Arc::new(config),
        session_authority: Arc::new(authority),
    })
}

/// Install the global subscriber: pretty console logs plus, when `log_file`
/// is set, structured JSON logs in that file.
pub fn init_tracing(log_file: Option<&str>) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sessionbridge_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| InfraError::LogFile {
                path: path.to_string(),
                source,
            })?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
