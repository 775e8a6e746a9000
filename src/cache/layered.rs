//! 正向缓存 + 负缓存的组合
//!
//! 读穿透加载与写路径失效之间的竞争通过分段代数（generation）解决：
//!
//! 1. 加载方在查询存储前调用 `begin_load` 记下所在分段的代数；
//! 2. 失效方持有分段锁时递增代数并移除条目；
//! 3. 加载方在 `complete_load` 中持有同一把锁比较代数，不一致则丢弃结果。
//!
//! 因此在写操作确认之后，不会有读取到旧值的加载把它重新放回缓存。
//! 命中路径只访问 moka，不触碰分段锁。

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};
use xxhash_rust::xxh64::xxh64;

use super::traits::{CacheHealthStatus, CacheResult, CompositeCacheTrait};
use super::{CacheEntry, NegativeCache, ObjectCache};

const GENERATION_STRIPES: usize = 64;

/// 读穿透加载凭证
#[derive(Debug)]
#[must_use = "a ticket must be passed to complete_load"]
pub struct LoadTicket {
    key: String,
    stripe: usize,
    generation: u64,
}

pub struct LayeredCache {
    object: Arc<dyn ObjectCache>,
    negative: Arc<dyn NegativeCache>,
    generations: Box<[Mutex<u64>]>,
}

impl LayeredCache {
    pub fn new(object: Arc<dyn ObjectCache>, negative: Arc<dyn NegativeCache>) -> Self {
        let generations = (0..GENERATION_STRIPES)
            .map(|_| Mutex::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            object,
            negative,
            generations,
        }
    }

    #[inline]
    fn stripe_of(key: &str) -> usize {
        (xxh64(key.as_bytes(), 0) % GENERATION_STRIPES as u64) as usize
    }
}

impl CompositeCacheTrait for LayeredCache {
    fn get(&self, key: &str) -> CacheResult {
        if let Some(entry) = self.object.get(key) {
            trace!("Object cache hit: {}", key);
            return CacheResult::Found(entry);
        }
        if self.negative.contains(key) {
            return CacheResult::NotFound;
        }
        CacheResult::Miss
    }

    fn begin_load(&self, key: &str) -> LoadTicket {
        let stripe = Self::stripe_of(key);
        let generation = *self.generations[stripe].lock();
        LoadTicket {
            key: key.to_string(),
            stripe,
            generation,
        }
    }

    fn complete_load(&self, ticket: LoadTicket, entry: Option<CacheEntry>) -> bool {
        let generation = self.generations[ticket.stripe].lock();
        if *generation != ticket.generation {
            debug!(
                "Discarding stale load for '{}' (generation {} -> {})",
                ticket.key, ticket.generation, *generation
            );
            return false;
        }

        match entry {
            Some(entry) => {
                self.negative.remove(&ticket.key);
                self.object.insert(ticket.key, entry);
            }
            None => {
                self.object.remove(&ticket.key);
                self.negative.mark(&ticket.key);
            }
        }
        true
    }

    fn invalidate(&self, key: &str) {
        let mut generation = self.generations[Self::stripe_of(key)].lock();
        *generation = generation.wrapping_add(1);
        self.object.remove(key);
        self.negative.remove(key);
        trace!("Invalidated cache entry: {}", key);
    }

    fn invalidate_all(&self) {
        let mut guards: Vec<_> = self.generations.iter().map(|g| g.lock()).collect();
        for generation in guards.iter_mut() {
            **generation = generation.wrapping_add(1);
        }
        self.object.invalidate_all();
        self.negative.clear();
    }

    fn warm(&self, entries: Vec<CacheEntry>) {
        let count = entries.len();
        for entry in entries {
            let ticket = self.begin_load(&entry.code);
            let _ = self.complete_load(ticket, Some(entry));
        }
        debug!("Cache warmed with {} entries", count);
    }

    fn health_check(&self) -> CacheHealthStatus {
        CacheHealthStatus {
            status: "healthy".to_string(),
            cache_type: self.object.cache_type().to_string(),
            negative_cache_enabled: self.negative.is_enabled(),
            object_entries: self.object.entry_count(),
            negative_entries: self.negative.entry_count(),
        }
    }
}
