use serde::Serialize;

use super::CacheEntry;

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult {
    /// 命中正向缓存
    Found(CacheEntry),
    /// 命中负缓存：短码确定不可用
    NotFound,
    /// 未命中，需要查询存储
    Miss,
}

/// 缓存健康状态
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealthStatus {
    pub status: String,
    pub cache_type: String,
    pub negative_cache_enabled: bool,
    pub object_entries: u64,
    pub negative_entries: u64,
}

/// 对外暴露的组合缓存
///
/// 所有方法都是同步的：命中路径不加锁，
/// 发布与失效只持有单个分段锁，且不会跨越 await。
pub trait CompositeCacheTrait: Send + Sync {
    fn get(&self, key: &str) -> CacheResult;

    /// 查询存储前领取加载凭证
    fn begin_load(&self, key: &str) -> super::LoadTicket;

    /// 发布加载结果：`Some` 写入正向缓存，`None` 写入负缓存。
    /// 凭证领取后若该短码被失效过，则丢弃结果并返回 false。
    fn complete_load(&self, ticket: super::LoadTicket, entry: Option<CacheEntry>) -> bool;

    /// 写路径调用：同步移除正向与负缓存中的条目
    fn invalidate(&self, key: &str);

    fn invalidate_all(&self);

    /// 批量预热（仅在启动阶段调用）
    fn warm(&self, entries: Vec<CacheEntry>);

    fn health_check(&self) -> CacheHealthStatus;
}

/// 正向缓存
pub trait ObjectCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn insert(&self, key: String, value: CacheEntry);
    fn remove(&self, key: &str);
    fn invalidate_all(&self);
    fn entry_count(&self) -> u64;
    fn cache_type(&self) -> &'static str;
}

/// 负缓存，记录不存在、已过期或已禁用的短码
pub trait NegativeCache: Send + Sync {
    fn contains(&self, key: &str) -> bool;
    fn mark(&self, key: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
    fn entry_count(&self) -> u64;
    fn is_enabled(&self) -> bool {
        true
    }
}
