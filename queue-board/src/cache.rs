//! Caching layer for backend API responses.
//!
//! Entries are keyed by the full request signature (path plus query string)
//! and hold the raw JSON payload. Two independent eviction rules apply:
//!
//! - **TTL on read.** An entry older than the cache duration is treated as
//!   absent and removed by the lookup that finds it. There is no sweeper.
//! - **Batch trim on write.** When an insert pushes the entry count past the
//!   maximum, the oldest entries by insertion time are dropped in one batch,
//!   whether or not they have expired.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{
    ApiClient, ApiError, CACHE_PATH, HEALTH_PATH, QueueSnapshot, Store, StoreId, StoreQuery,
    queues_endpoint,
};
use crate::error::ClassifiedError;
use crate::time::millis;

/// Keys longer than this are shortened in logs and stats.
const KEY_DISPLAY_LEN: usize = 50;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry stays fresh.
    pub ttl: Duration,

    /// Entry count above which a trim runs.
    pub max_entries: usize,

    /// How many of the oldest entries a trim removes.
    pub trim_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(3_000),
            max_entries: 20,
            trim_batch: 5,
        }
    }
}

struct CacheEntry {
    value: Arc<Value>,
    inserted_at: Instant,
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    next_seq: u64,
}

/// Snapshot of one cache entry for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntryStats {
    pub key: String,
    pub age_ms: u64,
}

/// Snapshot of the cache for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub entries: Vec<CacheEntryStats>,
}

/// Bounded TTL cache of raw API responses.
///
/// All access goes through one mutex; lookups may remove entries, so there is
/// no read-only path.
pub struct ResponseCache {
    entries: Mutex<Entries>,
    ttl: Duration,
    max_entries: usize,
    trim_batch: usize,
}

impl ResponseCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            ttl: config.ttl,
            max_entries: config.max_entries,
            trim_batch: config.trim_batch,
        }
    }

    /// Look up a fresh entry.
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.get_at(key, Instant::now())
    }

    /// Insert or overwrite an entry, then trim if over capacity.
    pub fn set(&self, key: impl Into<String>, value: Arc<Value>) {
        self.set_at(key.into(), value, Instant::now());
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().map.clear();
        info!("response cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current entries, oldest first, with their ages.
    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Arc<Value>> {
        let mut entries = self.entries.lock();

        let fresh = match entries.map.get(key) {
            None => return None,
            Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.ttl => {
                Some(Arc::clone(&entry.value))
            }
            Some(_) => None,
        };

        match fresh {
            Some(value) => {
                debug!(key = %truncate_key(key), "cache hit");
                Some(value)
            }
            None => {
                entries.map.remove(key);
                debug!(key = %truncate_key(key), "cache expired");
                None
            }
        }
    }

    fn set_at(&self, key: String, value: Arc<Value>, now: Instant) {
        let mut entries = self.entries.lock();

        let seq = entries.next_seq;
        entries.next_seq += 1;
        debug!(key = %truncate_key(&key), "cached response");
        entries.map.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                seq,
            },
        );

        if entries.map.len() > self.max_entries {
            let mut by_age: Vec<(Instant, u64, String)> = entries
                .map
                .iter()
                .map(|(k, e)| (e.inserted_at, e.seq, k.clone()))
                .collect();
            by_age.sort_unstable();

            let mut removed = 0;
            for (_, _, key) in by_age.into_iter().take(self.trim_batch) {
                entries.map.remove(&key);
                removed += 1;
            }
            debug!(removed, remaining = entries.map.len(), "cache trimmed");
        }
    }

    fn stats_at(&self, now: Instant) -> CacheStats {
        let entries = self.entries.lock();

        let mut listed: Vec<(u64, CacheEntryStats)> = entries
            .map
            .iter()
            .map(|(key, entry)| {
                let age = now.saturating_duration_since(entry.inserted_at);
                (
                    entry.seq,
                    CacheEntryStats {
                        key: truncate_key(key),
                        age_ms: millis(age),
                    },
                )
            })
            .collect();
        listed.sort_unstable_by_key(|(seq, _)| *seq);

        CacheStats {
            size: listed.len(),
            entries: listed.into_iter().map(|(_, stats)| stats).collect(),
        }
    }
}

/// Shorten a cache key for display.
fn truncate_key(key: &str) -> String {
    if key.chars().count() > KEY_DISPLAY_LEN {
        let head: String = key.chars().take(KEY_DISPLAY_LEN).collect();
        format!("{head}...")
    } else {
        key.to_string()
    }
}

/// Backend client with response caching.
///
/// Every fetch consults the cache first. Failures are classified and logged
/// here, at the boundary, and returned as [`ClassifiedError`].
pub struct CachedApiClient {
    client: ApiClient,
    cache: ResponseCache,
}

impl CachedApiClient {
    /// Create a new cached client.
    pub fn new(client: ApiClient, cache_config: &CacheConfig) -> Self {
        Self {
            client,
            cache: ResponseCache::new(cache_config),
        }
    }

    /// Store list near the query's coordinates.
    pub async fn fetch_stores(&self, query: &StoreQuery) -> Result<Vec<Store>, ClassifiedError> {
        query.validate()?;

        self.fetch_cached(&query.endpoint(), "fetch_stores", |value| {
            if !value.is_array() {
                return Err(ApiError::InvalidResponse(
                    "Invalid response: expected array of stores".to_string(),
                ));
            }
            Vec::<Store>::deserialize(value).map_err(|e| {
                ApiError::InvalidResponse(format!("Invalid response: malformed store list: {e}"))
            })
        })
        .await
    }

    /// Current queue numbers for one store.
    pub async fn fetch_queues(
        &self,
        store_id: StoreId,
        region: &str,
    ) -> Result<QueueSnapshot, ClassifiedError> {
        if store_id <= 0 {
            return Err(ClassifiedError::validation(format!(
                "Invalid storeId: {store_id} is not a valid store id"
            )));
        }

        let context = format!("fetch_queues store_id={store_id}");
        self.fetch_cached(&queues_endpoint(store_id, region), &context, |value| {
            if !value.is_object() {
                return Err(ApiError::InvalidResponse(
                    "Invalid response: expected queue data object".to_string(),
                ));
            }
            QueueSnapshot::deserialize(value).map_err(|e| {
                ApiError::InvalidResponse(format!("Invalid response: malformed queue data: {e}"))
            })
        })
        .await
    }

    /// Clear the local cache, then the backend's.
    ///
    /// The local clear always happens. A backend failure is reported as a
    /// partial failure with the backend error's kind.
    pub async fn clear_cache(&self) -> Result<(), ClassifiedError> {
        self.cache.clear();

        match self.client.delete(CACHE_PATH).await {
            Ok(_) => {
                info!("local and backend caches cleared");
                Ok(())
            }
            Err(e) => {
                let backend = ClassifiedError::from(e);
                let partial = ClassifiedError::new(
                    backend.kind(),
                    format!("Cache clear partially failed: {}", backend.message()),
                )
                .with_source(backend);
                partial.log("clear_cache");
                Err(partial)
            }
        }
    }

    /// Backend liveness payload. Never cached.
    pub async fn check_health(&self) -> Result<Value, ClassifiedError> {
        match self.client.get(HEALTH_PATH).await {
            Ok(value) => {
                debug!("backend health check succeeded");
                Ok(value)
            }
            Err(e) => {
                let err = ClassifiedError::from(e);
                err.log("check_health");
                Err(err)
            }
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Serve from cache or fetch, parse and cache.
    ///
    /// Only responses that parse are cached.
    async fn fetch_cached<T>(
        &self,
        endpoint: &str,
        context: &str,
        parse: impl Fn(&Value) -> Result<T, ApiError>,
    ) -> Result<T, ClassifiedError> {
        if let Some(cached) = self.cache.get(endpoint) {
            match parse(cached.as_ref()) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => debug!(endpoint, error = %e, "cached response no longer parses"),
            }
        }

        let result = match self.client.get(endpoint).await {
            Ok(value) => parse(&value).map(|parsed| (parsed, value)),
            Err(e) => Err(e),
        };

        match result {
            Ok((parsed, value)) => {
                self.cache.set(endpoint, Arc::new(value));
                Ok(parsed)
            }
            Err(e) => {
                let err = ClassifiedError::from(e);
                err.log(context);
                Err(err)
            }
        }
    }
}
