//! HTTP client factory with consistent timeout configuration.
//!
//! Outbound calls to the identity provider go through a client built here so
//! a slow upstream degrades into `ProviderError::Unavailable` instead of
//! stalling the request.

use reqwest::Client;
use std::time::Duration;

/// Connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Build an HTTP client whose total request time is capped at `request_timeout`.
pub fn build_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .build()
}
