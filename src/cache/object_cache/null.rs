use crate::cache::{CacheEntry, ObjectCache};

/// 不缓存任何内容（缓存关闭时使用）
pub struct NullObjectCache;

impl ObjectCache for NullObjectCache {
    fn get(&self, _key: &str) -> Option<CacheEntry> {
        None
    }

    fn insert(&self, _key: String, _value: CacheEntry) {}

    fn remove(&self, _key: &str) {}

    fn invalidate_all(&self) {}

    fn entry_count(&self) -> u64 {
        0
    }

    fn cache_type(&self) -> &'static str {
        "null"
    }
}
