//! Blocklist cache policy
//!
//! Lists are kept in a key-value store together with the time they were
//! fetched. A lookup serves the cached value while it is fresh, refreshes it
//! when it is missing or stale, and falls back to the last-known value (or an
//! empty list) when the refresh fails. Callers never see a fetch error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Store key for the channel list.
pub const CHANNELS_KEY: &str = "blacklist";
/// Store key for the category table.
pub const CATEGORIES_KEY: &str = "categories";

/// Default freshness window: 15 minutes.
pub const DEFAULT_TTL_MS: u64 = 15 * 60 * 1000;

/// A cached value with its fetch timestamp (milliseconds since the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry<T> {
    pub value: T,
    pub fetched_at_ms: u64,
}

/// Freshness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl_ms: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { ttl_ms: DEFAULT_TTL_MS }
    }
}

impl CachePolicy {
    pub fn is_fresh<T>(&self, entry: &CachedEntry<T>, now_ms: u64) -> bool {
        now_ms.saturating_sub(entry.fetched_at_ms) < self.ttl_ms
    }
}

/// Minimal string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Served from a fresh cache entry
    Fresh,
    /// Fetched from the remote source and stored
    Fetched,
    /// Fetch failed; last-known value (possibly stale)
    Stale,
    /// Fetch failed and nothing was cached
    Empty,
}

/// Cache front for the blocklist data source.
pub struct BlocklistCache<S> {
    store: S,
    policy: CachePolicy,
}

impl<S: KeyValueStore> BlocklistCache<S> {
    pub fn new(store: S, policy: CachePolicy) -> Self {
        Self { store, policy }
    }

    /// Read a cached entry. Undecodable entries count as missing.
    pub fn entry<T: DeserializeOwned>(&self, key: &str) -> Option<CachedEntry<T>> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("discarding undecodable cache entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Fresh cached value, if any.
    pub fn fresh<T: DeserializeOwned>(&self, key: &str, now_ms: u64) -> Option<T> {
        self.entry(key)
            .filter(|entry| self.policy.is_fresh(entry, now_ms))
            .map(|entry| entry.value)
    }

    /// Store a freshly fetched value.
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T, now_ms: u64) -> Result<()> {
        let entry = CachedEntry { value, fetched_at_ms: now_ms };
        let encoded = serde_json::to_string(&entry).map_err(|source| EngineError::CacheEncode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, encoded)
    }

    /// Resolve a value: fresh cache, else fetch, else last-known, else default.
    ///
    /// `fetch` is only invoked when the cached entry is missing or stale.
    pub fn resolve<T, E, F>(&mut self, key: &str, now_ms: u64, fetch: F) -> (T, Origin)
    where
        T: Serialize + DeserializeOwned + Default,
        E: std::fmt::Display,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let cached = match self.entry::<T>(key) {
            Some(entry) if self.policy.is_fresh(&entry, now_ms) => {
                return (entry.value, Origin::Fresh);
            }
            other => other,
        };

        match fetch() {
            Ok(value) => {
                if let Err(e) = self.put(key, &value, now_ms) {
                    log::warn!("failed to cache '{}': {}", key, e);
                }
                (value, Origin::Fetched)
            }
            Err(e) => {
                log::warn!("fetching '{}' failed, using last-known value: {}", key, e);
                match cached {
                    Some(entry) => (entry.value, Origin::Stale),
                    None => (T::default(), Origin::Empty),
                }
            }
        }
    }
}

/// In-memory store, handy for tests and short-lived tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: std::collections::HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
