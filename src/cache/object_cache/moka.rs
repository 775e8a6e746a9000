use std::time::{Duration, Instant};

use moka::policy::{EvictionPolicy, Expiry};
use moka::sync::Cache;
use tracing::debug;

use crate::cache::{CacheEntry, ObjectCache};

/// 过期策略：取缓存 TTL 与链接剩余有效期中较小者
struct CacheEntryExpiry {
    max_ttl: Duration,
}

impl CacheEntryExpiry {
    fn lifetime(&self, value: &CacheEntry) -> Duration {
        match value.expires_at {
            Some(expires_at) => {
                let remaining = (expires_at - chrono::Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                remaining.min(self.max_ttl)
            }
            None => self.max_ttl,
        }
    }
}

impl Expiry<String, CacheEntry> for CacheEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.lifetime(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.lifetime(value))
    }
}

/// 基于 moka 的有界 LRU 缓存
pub struct MokaObjectCache {
    inner: Cache<String, CacheEntry>,
}

impl MokaObjectCache {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(CacheEntryExpiry {
                max_ttl: Duration::from_secs(ttl_secs),
            })
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}, ttl: {}s",
            max_capacity, ttl_secs
        );
        Self { inner }
    }

    #[cfg(test)]
    fn sync(&self) {
        self.inner.run_pending_tasks();
    }
}

impl ObjectCache for MokaObjectCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key)
    }

    fn insert(&self, key: String, value: CacheEntry) {
        if value.is_expired(chrono::Utc::now()) {
            return;
        }
        self.inner.insert(key, value);
    }

    fn remove(&self, key: &str) {
        self.inner.invalidate(key);
    }

    fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    fn cache_type(&self) -> &'static str {
        "memory"
    }
}
