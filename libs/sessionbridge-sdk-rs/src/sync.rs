//! The client sync state machine.
//!
//! `reconcile` compares the subdomain's local identity with the shared cookie
//! (through the exchange endpoint) and resolves any discrepancy. It always
//! returns a definite `SyncOutcome`; failures degrade to a logged-out result.
//!
//! Extending the cookie is left to the caller so that `reconcile` returns as
//! soon as the state is known:
//!
//! ```rust,ignore
//! let outcome = sync.reconcile_with_store(store.as_ref()).await;
//! if outcome.is_signed_in() {
//!     let (sync, store) = (sync.clone(), store.clone());
//!     tokio::spawn(async move { sync.refresh_with_store(store.as_ref()).await });
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::identity::{LocalIdentity, LocalUser, SessionApi};
use crate::state::{CacheEntry, KeyValueStore, SyncState};

/// Timing knobs for reconciliation.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long a cache entry counts as a hint (default: 5 minutes).
    pub cache_ttl: Duration,

    /// Minimum gap between cookie refreshes (default: 30 minutes).
    pub refresh_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            refresh_interval: Duration::from_secs(30 * 60),
        }
    }
}

/// Terminal states of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No cookie session and no local identity.
    NoSession,
    /// The cookie is gone, so the local identity was signed out.
    SignedOutFromCookie,
    /// The cookie is gone and the unverified lock is set; signed out for good.
    LockedSignedOut,
    /// A different local user was replaced by the cookie's user.
    SwitchedToCookieUser { uid: String },
    /// The local identity matches the cookie.
    SignedIn { uid: String },
}

impl SyncOutcome {
    /// True for the two outcomes that leave a local identity in place; the
    /// shared cookie should then be refreshed with `refresh_cookie`.
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. } | Self::SwitchedToCookieUser { .. })
    }
}

#[derive(Clone)]
pub struct SessionSync {
    api: Arc<dyn SessionApi>,
    identity: Arc<dyn LocalIdentity>,
    config: SyncConfig,
}

impl SessionSync {
    pub fn new(
        api: Arc<dyn SessionApi>,
        identity: Arc<dyn LocalIdentity>,
        config: SyncConfig,
    ) -> Self {
        Self {
            api,
            identity,
            config,
        }
    }

    /// Load state from `store`, reconcile, and persist the result.
    pub async fn reconcile_with_store(&self, store: &dyn KeyValueStore) -> SyncOutcome {
        let mut state = SyncState::load(store);
        let outcome = self.reconcile(&mut state).await;
        state.save(store);
        outcome
    }

    /// Load state from `store`, run the throttled cookie refresh, and persist it.
    pub async fn refresh_with_store(&self, store: &dyn KeyValueStore) -> bool {
        let mut state = SyncState::load(store);
        let refreshed = self.refresh_cookie(&mut state).await;
        state.save(store);
        refreshed
    }

    pub async fn reconcile(&self, state: &mut SyncState) -> SyncOutcome {
        self.reconcile_at(state, now()).await
    }

    async fn reconcile_at(&self, state: &mut SyncState, now: i64) -> SyncOutcome {
        // The cache is a hint only; the exchange call below always runs.
        if let Some(uid) = state.cached_uid(now, self.config.cache_ttl.as_secs() as i64) {
            debug!(uid = %uid, "Cached session hint");
        }

        let exchange = match self.api.exchange().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Exchange failed; treating as no session");
                Default::default()
            }
        };

        let cookie_uid = exchange.uid.filter(|_| exchange.authenticated);
        let Some(cookie_uid) = cookie_uid else {
            state.cache = None;

            let Some(local) = self.identity.current_user().await else {
                return SyncOutcome::NoSession;
            };
            self.sign_out_locally(&local).await;

            if state.unverified_lock {
                info!(uid = %local.uid, "Cookie gone and unverified lock set");
                return SyncOutcome::LockedSignedOut;
            }
            info!(uid = %local.uid, "Cookie gone; signed out locally");
            return SyncOutcome::SignedOutFromCookie;
        };

        state.cache = Some(CacheEntry {
            uid: Some(cookie_uid.clone()),
            authenticated: true,
            timestamp: now,
        });

        let mut switched = false;
        let mut local = self.identity.current_user().await;
        if let Some(user) = local.as_ref()
            && user.uid != cookie_uid
        {
            info!(local = %user.uid, cookie = %cookie_uid, "Switching to cookie user");
            self.sign_out_locally(user).await;
            switched = true;
            local = None;
        }

        if local.is_none() {
            let Some(token) = exchange.custom_token else {
                warn!(uid = %cookie_uid, "Session valid but no sign-in token provided");
                return SyncOutcome::NoSession;
            };

            match self.identity.sign_in_with_custom_token(&token).await {
                Ok(user) if user.uid == cookie_uid => {
                    info!(uid = %user.uid, "Adopted session from cookie");
                }
                Ok(user) => {
                    warn!(expected = %cookie_uid, got = %user.uid, "Sign-in token redeemed for another user");
                    self.sign_out_locally(&user).await;
                    return SyncOutcome::NoSession;
                }
                Err(e) => {
                    warn!(uid = %cookie_uid, error = %e, "Sign-in token redemption failed");
                    return SyncOutcome::NoSession;
                }
            }
        }

        if switched {
            SyncOutcome::SwitchedToCookieUser { uid: cookie_uid }
        } else {
            SyncOutcome::SignedIn { uid: cookie_uid }
        }
    }

    /// Extend the shared cookie from the local identity, at most once per
    /// `refresh_interval`. Returns whether a refresh happened.
    pub async fn refresh_cookie(&self, state: &mut SyncState) -> bool {
        self.refresh_cookie_at(state, now()).await
    }

    async fn refresh_cookie_at(&self, state: &mut SyncState, now: i64) -> bool {
        let interval = self.config.refresh_interval.as_secs() as i64;
        if state.last_cookie_sync.is_some_and(|last| now - last < interval) {
            return false;
        }
        self.publish_session_at(state, now).await
    }

    /// Set the shared cookie from the local identity right away, ignoring the
    /// throttle. Use after a fresh local sign-in.
    pub async fn publish_session(&self, state: &mut SyncState) -> bool {
        self.publish_session_at(state, now()).await
    }

    async fn publish_session_at(&self, state: &mut SyncState, now: i64) -> bool {
        if self.identity.current_user().await.is_none() {
            return false;
        }

        let id_token = match self.identity.id_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "No proof token for cookie refresh");
                return false;
            }
        };

        match self.api.login(&id_token).await {
            Ok(response) if response.success => {
                debug!("Session cookie refreshed");
                state.last_cookie_sync = Some(now);
                true
            }
            Ok(response) => {
                warn!(reason = ?response.reason, "Cookie refresh rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "Cookie refresh failed");
                false
            }
        }
    }

    /// Sign this subdomain out and clear the shared cookie for every other one.
    pub async fn sign_out(&self, state: &mut SyncState, everywhere: bool) {
        if let Err(e) = self.api.logout(everywhere).await {
            warn!(error = %e, "Logout call failed; signing out locally anyway");
        }
        if let Some(local) = self.identity.current_user().await {
            self.sign_out_locally(&local).await;
        }
        state.cache = None;
        state.last_cookie_sync = None;
    }

    async fn sign_out_locally(&self, user: &LocalUser) {
        if let Err(e) = self.identity.sign_out().await {
            warn!(uid = %user.uid, error = %e, "Local sign-out failed");
        }
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
