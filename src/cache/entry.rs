use chrono::{DateTime, Utc};

use crate::storage::LinkMapping;

/// 缓存中的链接快照，可随时丢弃，权威数据始终在存储中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub code: String,
    pub target: String,
    /// 随条目一起缓存，命中时仍需检查
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn from_mapping(link: &LinkMapping) -> Self {
        Self {
            code: link.code.clone(),
            target: link.target.clone(),
            expires_at: link.expires_at,
            created_at: link.created_at,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
