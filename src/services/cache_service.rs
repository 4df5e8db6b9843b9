use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::CacheSettings;
use crate::models::{CacheStatsResponse, ResultRecord, SearchQuery};
use crate::utils::cache_key;

#[derive(Debug, Clone)]
struct MemoryEntry {
    records: Vec<ResultRecord>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

#[derive(Clone)]
pub struct CacheService {
    settings: CacheSettings,
    memory_cache: Arc<Mutex<LruCache<String, MemoryEntry>>>,
    stats: Arc<CacheStats>,
}

impl CacheService {
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            settings,
            memory_cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            stats: Arc::new(CacheStats::default()),
        }
    }

    fn key_for(query: &SearchQuery) -> String {
        cache_key(&[&query.keyword().to_lowercase(), &query.limit().to_string()])
    }

    pub async fn get(&self, query: &SearchQuery) -> Option<Vec<ResultRecord>> {
        if !self.settings.enabled {
            return None;
        }

        let key = Self::key_for(query);
        let mut cache = self.memory_cache.lock().await;
        if let Some(entry) = cache.get(&key) {
            if entry.expires_at > Utc::now() {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.records.clone());
            }
        }
        cache.pop(&key);
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub async fn set(&self, query: &SearchQuery, records: &[ResultRecord]) {
        if !self.settings.enabled {
            return;
        }

        let expires_at = Utc::now() + Duration::seconds(self.settings.ttl_seconds as i64);
        let mut cache = self.memory_cache.lock().await;
        cache.put(
            Self::key_for(query),
            MemoryEntry {
                records: records.to_vec(),
                expires_at,
            },
        );
    }

    pub async fn snapshot(&self) -> CacheStatsResponse {
        CacheStatsResponse {
            enabled: self.settings.enabled,
            entries: self.memory_cache.lock().await.len(),
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
        }
    }
}
