use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes returned by sessionbridge endpoints in `{ "code": ... }` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigurationError,
    InvalidProof,
    NoSession,
    InvalidSession,
    Revoked,
    ProviderUnavailable,
    InvalidInput,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::InvalidProof => "INVALID_PROOF",
            Self::NoSession => "NO_SESSION",
            Self::InvalidSession => "INVALID_SESSION",
            Self::Revoked => "REVOKED",
            Self::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Session credential codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No key material is loaded for the requested operation.
    #[error("Signing key not configured: {0}")]
    Configuration(String),

    #[error("Invalid token format: {0}")]
    Format(String),

    #[error("Invalid signature")]
    Signature,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid claims: {0}")]
    Claims(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serde() {
        let code = ErrorCode::InvalidSession;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#""INVALID_SESSION""#);

        let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, code);
    }

    #[test]
    fn test_error_code_display_matches_serde() {
        let code = ErrorCode::ProviderUnavailable;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, format!("\"{}\"", code));
    }
}
