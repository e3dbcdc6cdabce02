use sessionbridge_types::ErrorCode;
use thiserror::Error;

/// SDK-specific errors.
///
/// The reconciliation entry point never returns these; it logs them and
/// degrades to a logged-out outcome. They surface only from the lower-level
/// `SessionApi` and `LocalIdentity` calls.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Network error (only with `client` feature)
    #[cfg(feature = "client")]
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// API returned an error
    #[error("API error: {code} - {message}")]
    Api { code: ErrorCode, message: String },

    /// The local identity SDK failed (sign-in, sign-out, token refresh).
    #[error("Local identity error: {0}")]
    Identity(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
