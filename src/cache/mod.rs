//! 读穿透缓存
//!
//! 正向缓存保存可用链接，负缓存保存不存在或不可用的短码。
//! 写路径通过 [`CompositeCacheTrait::invalidate`] 同步失效。

pub mod entry;
pub mod layered;
pub mod negative_cache;
pub mod object_cache;
pub mod traits;

use std::sync::Arc;

use tracing::info;

use crate::config::CacheConfig;

pub use entry::CacheEntry;
pub use layered::{LayeredCache, LoadTicket};
pub use traits::{CacheHealthStatus, CacheResult, CompositeCacheTrait, NegativeCache, ObjectCache};

/// 根据配置创建缓存；`enabled = false` 时使用空实现
pub fn create_cache(config: &CacheConfig) -> Arc<dyn CompositeCacheTrait> {
    if !config.enabled {
        info!("Cache disabled, every lookup goes to storage");
        return Arc::new(LayeredCache::new(
            Arc::new(object_cache::NullObjectCache),
            Arc::new(negative_cache::NullNegativeCache),
        ));
    }

    info!(
        "Memory cache enabled: capacity={}, ttl={}s, negative_ttl={}s",
        config.max_capacity, config.default_ttl, config.negative_ttl
    );
    Arc::new(LayeredCache::new(
        Arc::new(object_cache::MokaObjectCache::new(
            config.max_capacity,
            config.default_ttl,
        )),
        Arc::new(negative_cache::MokaNegativeCache::new(
            config.negative_capacity,
            config.negative_ttl,
        )),
    ))
}
