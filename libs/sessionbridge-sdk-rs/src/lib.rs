//! Client side of sessionbridge: keeps one subdomain's local login state
//! consistent with the domain-wide session cookie.
//!
//! # Features
//!
//! - **Reconciliation** - `SessionSync::reconcile` runs once per page load and
//!   always ends in a definite `SyncOutcome`
//! - **Persisted state** - cache entry, unverified-lock flag and last cookie
//!   refresh live in a `KeyValueStore`
//! - **HTTP client** - `HttpSessionApi` talks to the token exchange endpoints
//!   (only with the `client` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sessionbridge_sdk::{ClientConfig, HttpSessionApi, MemoryStore, SessionSync, SyncConfig};
//!
//! let api = HttpSessionApi::new(ClientConfig::new("https://auth.example.com/api/session"))?;
//! let sync = SessionSync::new(Arc::new(api), identity, SyncConfig::default());
//!
//! let store = MemoryStore::new();
//! let outcome = sync.reconcile_with_store(&store).await;
//! println!("{outcome:?}");
//! ```

#[cfg(feature = "client")]
mod api;
mod error;
mod identity;
mod state;
mod sync;

#[cfg(feature = "client")]
pub use api::{ClientConfig, HttpSessionApi};
pub use error::SdkError;
pub use identity::{LocalIdentity, LocalUser, SessionApi};
pub use state::{CacheEntry, KeyValueStore, MemoryStore, SyncState};
pub use sync::{SessionSync, SyncConfig, SyncOutcome};

// Re-export shared types for convenience
pub use sessionbridge_types::{
    ErrorCode, ExchangeResponse, LoginResponse, LogoutResponse, SessionIdentity, StatusResponse,
};
