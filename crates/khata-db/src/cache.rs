//! # Query Cache
//!
//! Remembers the last full listing of each entity class so repeat reads
//! inside the staleness window skip the store.
//!
//! ## Read / Write Interaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  list()                                                                 │
//! │    │                                                                    │
//! │    ├── entry present AND age < window ──► HIT: return cached listing   │
//! │    │                                                                    │
//! │    └── otherwise ──► MISS: read store ──► put(listing, now) ──► return │
//! │                                                                         │
//! │  add / update / upsert / save                                           │
//! │    │                                                                    │
//! │    └── store write OK ──► invalidate(namespace) ──► return record      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries hold the listing as a `serde_json::Value` so one map serves every
//! entity type. Freshness is decided by [`is_fresh`], a pure function of two
//! instants and the window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::store::Namespace;

struct CacheEntry {
    listing: serde_json::Value,
    fetched_at: Instant,
}

/// Whether a listing fetched at `fetched_at` may still be served at `now`.
///
/// A zero window never serves from cache.
pub fn is_fresh(fetched_at: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(fetched_at) < window
}

/// Per-entity listing cache, shared by every repository of a [`Database`].
///
/// [`Database`]: crate::pool::Database
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<DashMap<Namespace, CacheEntry>>,
    staleness_window: Duration,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        QueryCache {
            entries: Arc::new(DashMap::new()),
            staleness_window: config.staleness_window,
        }
    }

    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    /// Returns the cached listing if it is still fresh.
    pub fn get<T: DeserializeOwned>(&self, ns: Namespace) -> Option<Vec<T>> {
        self.get_at(ns, Instant::now())
    }

    /// [`get`](Self::get) against an explicit clock reading.
    pub fn get_at<T: DeserializeOwned>(&self, ns: Namespace, now: Instant) -> Option<Vec<T>> {
        let listing = match self.entries.get(&ns) {
            Some(entry) if is_fresh(entry.fetched_at, now, self.staleness_window) => {
                entry.listing.clone()
            }
            Some(_) => {
                debug!(namespace = %ns, "Cache STALE");
                return None;
            }
            None => {
                debug!(namespace = %ns, "Cache MISS");
                return None;
            }
        };

        match serde_json::from_value(listing) {
            Ok(items) => {
                debug!(namespace = %ns, "Cache HIT");
                Some(items)
            }
            Err(e) => {
                warn!(namespace = %ns, error = %e, "Cached listing has the wrong shape, dropping it");
                self.entries.remove(&ns);
                None
            }
        }
    }

    /// Records a listing fetched just now.
    pub fn put<T: Serialize>(&self, ns: Namespace, listing: &[T]) {
        self.put_at(ns, listing, Instant::now());
    }

    pub fn put_at<T: Serialize>(&self, ns: Namespace, listing: &[T], fetched_at: Instant) {
        match serde_json::to_value(listing) {
            Ok(listing) => {
                self.entries.insert(ns, CacheEntry { listing, fetched_at });
                debug!(namespace = %ns, "Cache SET");
            }
            Err(e) => warn!(namespace = %ns, error = %e, "Listing not cacheable"),
        }
    }

    /// Forgets the listing so the next read goes to the store.
    pub fn invalidate(&self, ns: Namespace) {
        self.entries.remove(&ns);
        debug!(namespace = %ns, "Cache INVALIDATE");
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(&self, ns: Namespace) -> bool {
        self.entries.contains_key(&ns)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.len())
            .field("staleness_window", &self.staleness_window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(window: Duration) -> QueryCache {
        QueryCache::new(&CacheConfig {
            staleness_window: window,
        })
    }

    #[test]
    fn test_is_fresh() {
        let t0 = Instant::now();
        let window = Duration::from_secs(60);

        assert!(is_fresh(t0, t0, window));
        assert!(is_fresh(t0, t0 + Duration::from_secs(59), window));
        assert!(!is_fresh(t0, t0 + Duration::from_secs(60), window));
        assert!(!is_fresh(t0, t0, Duration::ZERO));
        // clock reading before the fetch counts as age zero
        assert!(is_fresh(t0 + Duration::from_secs(5), t0, window));
    }

    #[test]
    fn test_hit_within_window() {
        let cache = cache(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put_at(Namespace::Products, &["a".to_string()], t0);

        let hit: Option<Vec<String>> =
            cache.get_at(Namespace::Products, t0 + Duration::from_secs(30));
        assert_eq!(hit, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_stale_after_window() {
        let cache = cache(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put_at(Namespace::Products, &[1, 2, 3], t0);

        let stale: Option<Vec<i32>> =
            cache.get_at(Namespace::Products, t0 + Duration::from_secs(61));
        assert!(stale.is_none());
    }

    #[test]
    fn test_invalidate_forces_miss() {
        let cache = cache(Duration::from_secs(60));
        cache.put(Namespace::Customers, &[1]);
        cache.put(Namespace::Invoices, &[2]);

        cache.invalidate(Namespace::Customers);

        assert!(cache.get::<i32>(Namespace::Customers).is_none());
        assert_eq!(cache.get::<i32>(Namespace::Invoices), Some(vec![2]));
    }

    #[test]
    fn test_wrong_shape_is_a_miss() {
        let cache = cache(Duration::from_secs(60));
        cache.put(Namespace::Products, &["not a number"]);

        assert!(cache.get::<i64>(Namespace::Products).is_none());
        assert!(!cache.contains(Namespace::Products));
    }
}
