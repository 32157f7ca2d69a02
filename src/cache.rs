//! In-memory TTL cache for market parameters.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::calibration::MarketParameters;
use crate::error::Result;

/// Cache key: upper-cased symbol and region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub region: String,
}

impl CacheKey {
    pub fn new(symbol: &str, region: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            region: region.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.region, self.symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    parameters: MarketParameters,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Thread-safe parameter cache.
///
/// One mutex guards the map. Fetches run outside the lock, so two concurrent misses
/// on the same key may both fetch; the later insert wins.
#[derive(Debug, Default)]
pub struct ParameterCache {
    inner: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ParameterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valid cached parameters for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<MarketParameters> {
        let now = Instant::now();
        self.inner
            .lock()
            .get(key)
            .filter(|entry| entry.is_valid(now))
            .map(|entry| entry.parameters.clone())
    }

    /// Stores `parameters` for `ttl`, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, parameters: MarketParameters, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.inner.lock().insert(
            key,
            CacheEntry {
                parameters,
                expires_at,
            },
        );
    }

    /// Returns the cached value or runs `fetch` and caches its result.
    ///
    /// Errors from `fetch` are returned and nothing is cached.
    pub fn get_or_fetch<F>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<MarketParameters>
    where
        F: FnOnce() -> Result<MarketParameters>,
    {
        if let Some(hit) = self.get(key) {
            tracing::trace!(%key, "parameter cache hit");
            return Ok(hit);
        }

        let parameters = fetch()?;
        self.insert(key.clone(), parameters.clone(), ttl);
        Ok(parameters)
    }

    /// Removes one entry, or everything when `key` is `None`. Returns the count removed.
    pub fn invalidate(&self, key: Option<&CacheKey>) -> usize {
        let mut map = self.inner.lock();
        match key {
            Some(key) => usize::from(map.remove(key).is_some()),
            None => {
                let count = map.len();
                map.clear();
                count
            }
        }
    }

    /// Removes every entry of `region`. Returns the count removed.
    pub fn invalidate_region(&self, region: &str) -> usize {
        let region = region.trim().to_uppercase();
        let mut map = self.inner.lock();
        let before = map.len();
        map.retain(|key, _| key.region != region);
        before - map.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let map = self.inner.lock();
        let valid_entries = map.values().filter(|entry| entry.is_valid(now)).count();
        CacheStats {
            total_entries: map.len(),
            valid_entries,
            expired_entries: map.len() - valid_entries,
        }
    }
}
