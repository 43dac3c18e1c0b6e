//! In-memory memoization of fetched price series, keyed by ticker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{PriceSeries, Symbol};

/// Defines how a single fetch interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a live entry is present;
    /// otherwise fetch from the network and store the result. (Default)
    #[default]
    Use,
    /// Always fetch from the network and overwrite any cached entry.
    Refresh,
    /// Always fetch from the network; neither read nor write the cache.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: Arc<PriceSeries>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now <= expires_at)
    }
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<Symbol, CacheEntry>,
    ttl: Option<Duration>,
}

impl CacheInner {
    fn get(&self, key: &Symbol) -> Option<Arc<PriceSeries>> {
        let now = Instant::now();
        self.map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| Arc::clone(&entry.series))
    }

    fn put(&mut self, key: Symbol, series: Arc<PriceSeries>) {
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        self.map.insert(key, CacheEntry { series, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.is_live(now));
    }
}

/// Write-once, read-many cache of fetched series shared across runs.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl CacheStore {
    /// Create a cache whose entries expire after `ttl`; `None` never expires.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    /// Cache that keeps entries for the lifetime of the process.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub async fn get(&self, key: &Symbol) -> Option<Arc<PriceSeries>> {
        let store = self.inner.read().await;
        store.get(key)
    }

    pub async fn put(&self, key: Symbol, series: Arc<PriceSeries>) {
        let mut store = self.inner.write().await;
        store.put(key, series);
    }

    /// Drop the entry for one ticker. Returns whether an entry was present.
    pub async fn invalidate(&self, key: &Symbol) -> bool {
        let mut store = self.inner.write().await;
        store.map.remove(key).is_some()
    }

    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        store.clear_expired();
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of entries, including expired ones not yet cleared.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn key(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("symbol")
    }

    fn series(raw: &str) -> Arc<PriceSeries> {
        Arc::new(PriceSeries::from_unordered(
            key(raw),
            date!(2015 - 01 - 01),
            Vec::new(),
        ))
    }

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let cache = CacheStore::unbounded();
        let aapl = key("AAPL");

        assert!(cache.get(&aapl).await.is_none());

        cache.put(aapl.clone(), series("AAPL")).await;
        let cached = cache.get(&aapl).await.expect("cached");
        assert_eq!(cached.symbol().as_str(), "AAPL");
        assert!(cache.get(&key("GOOG")).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = CacheStore::new(Some(Duration::from_millis(100)));
        let msft = key("MSFT");

        cache.put(msft.clone(), series("MSFT")).await;
        assert!(cache.get(&msft).await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&msft).await.is_none());

        cache.clear_expired().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_invalidate_single_key() {
        let cache = CacheStore::unbounded();
        cache.put(key("AAPL"), series("AAPL")).await;
        cache.put(key("GME"), series("GME")).await;

        assert!(cache.invalidate(&key("AAPL")).await);
        assert!(!cache.invalidate(&key("AAPL")).await);
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_cache_mode_default() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
