use sessionbridge_types::CodecError;
use thiserror::Error;

pub use sessionbridge_types::ErrorCode;

#[derive(Error, Debug)]
pub enum AppError {
    /// No signing key available. Fatal to signing, not to the process.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid proof-of-identity token: {0}")]
    InvalidProof(String),

    #[error("No session cookie")]
    NoSession,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Session revoked")]
    Revoked,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::InvalidProof(_) => ErrorCode::InvalidProof,
            AppError::NoSession => ErrorCode::NoSession,
            AppError::InvalidSession(_) => ErrorCode::InvalidSession,
            AppError::Revoked => ErrorCode::Revoked,
            AppError::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Short reason string used in soft-failure bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "signing_unavailable",
            AppError::InvalidProof(_) => "invalid_proof",
            AppError::NoSession => "no_session",
            AppError::InvalidSession(_) => "invalid_session",
            AppError::Revoked => "revoked",
            AppError::ProviderUnavailable(_) => "provider_unavailable",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Codec failures on the verification path all mean "not a valid session";
/// only a missing key is a configuration problem.
impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::InvalidSession(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
