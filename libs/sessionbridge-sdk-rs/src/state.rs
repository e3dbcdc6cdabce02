//! Persisted client state for the reconciliation state machine.
//!
//! The state machine itself is pure over `SyncState`; persistence goes
//! through the small `KeyValueStore` capability so any origin-scoped storage
//! can back it.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

const CACHE_KEY: &str = "sessionbridge.cache";
const LOCK_KEY: &str = "sessionbridge.unverified_lock";
const LAST_SYNC_KEY: &str = "sessionbridge.last_cookie_sync";

/// Origin-scoped string storage (browser local storage or equivalent).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process `KeyValueStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Advisory record of the last authoritative check. Never gates correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub uid: Option<String>,
    pub authenticated: bool,
    /// Unix timestamp of the check.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub cache: Option<CacheEntry>,
    /// Set by a surrounding gate (e.g., unverified email) to forbid
    /// resurrecting a session from the cookie once it is gone.
    pub unverified_lock: bool,
    /// Unix timestamp of the last successful cookie refresh.
    pub last_cookie_sync: Option<i64>,
}

impl SyncState {
    /// Read the state; unreadable entries are dropped, never fatal.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let cache = store
            .get(CACHE_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session cache");
                    None
                }
            });

        Self {
            cache,
            unverified_lock: store.get(LOCK_KEY).is_some_and(|v| v == "1"),
            last_cookie_sync: store.get(LAST_SYNC_KEY).and_then(|v| v.parse().ok()),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        match self.cache.as_ref().map(serde_json::to_string) {
            Some(Ok(raw)) => store.set(CACHE_KEY, raw),
            Some(Err(e)) => warn!(error = %e, "Session cache not persisted"),
            None => store.remove(CACHE_KEY),
        }

        if self.unverified_lock {
            store.set(LOCK_KEY, "1".into());
        } else {
            store.remove(LOCK_KEY);
        }

        match self.last_cookie_sync {
            Some(ts) => store.set(LAST_SYNC_KEY, ts.to_string()),
            None => store.remove(LAST_SYNC_KEY),
        }
    }

    pub fn mark_unverified(&mut self) {
        self.unverified_lock = true;
    }

    pub fn clear_unverified(&mut self) {
        self.unverified_lock = false;
    }

    /// The cached uid if the cache says authenticated and is younger than `ttl_secs`.
    pub fn cached_uid(&self, now: i64, ttl_secs: i64) -> Option<&str> {
        self.cache
            .as_ref()
            .filter(|c| c.authenticated && now - c.timestamp < ttl_secs)
            .and_then(|c| c.uid.as_deref())
    }
}
