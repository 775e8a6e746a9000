use crate::cache::NegativeCache;

/// 空实现：从不记录
pub struct NullNegativeCache;

impl NegativeCache for NullNegativeCache {
    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn mark(&self, _key: &str) {}

    fn remove(&self, _key: &str) {}

    fn clear(&self) {}

    fn entry_count(&self) -> u64 {
        0
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
