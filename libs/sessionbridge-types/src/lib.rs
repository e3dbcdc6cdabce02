//! Shared types and the session credential codec for sessionbridge.
//!
//! This crate provides:
//! - The session credential claims (`SessionClaims`, `SessionIdentity`)
//! - The compact signed-token codec (`CredentialCodec`, `KeyPair`)
//! - Request/response bodies of the token exchange endpoints
//! - Error codes shared by the API and the client SDK

mod claims;
mod codec;
mod errors;
mod responses;

pub use claims::{SessionClaims, SessionIdentity};
pub use codec::{ALGORITHM, CredentialCodec, KeyPair};
pub use errors::{CodecError, ErrorCode};
pub use responses::{
    ExchangeResponse, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, StatusResponse,
};
