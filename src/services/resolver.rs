//! 短码解析
//!
//! 缓存命中直接返回；未命中时在超时内回源，并按链接状态写入
//! 正向缓存或负缓存。过期与禁用的链接永远不会返回目标地址。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheResult, CompositeCacheTrait};
use crate::config::RoutingConfig;
use crate::errors::{Result, ShortlinkError};
use crate::hits::HitCounter;
use crate::storage::{LinkMapping, LinkState, LinkStore};
use crate::utils::{is_valid_short_code, normalize_code};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotFoundReason {
    Unknown,
    Expired,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(String),
    NotFound(NotFoundReason),
}

/// `/{code}+` 返回的公开信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct Resolver {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn CompositeCacheTrait>,
    hits: Option<HitCounter>,
    timeout: Duration,
    ignore_case: bool,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn LinkStore>,
        cache: Arc<dyn CompositeCacheTrait>,
        routing: &RoutingConfig,
    ) -> Self {
        Self {
            store,
            cache,
            hits: None,
            timeout: Duration::from_millis(routing.resolve_timeout_ms.max(1)),
            ignore_case: routing.ignore_case,
        }
    }

    pub fn with_hits(mut self, hits: HitCounter) -> Self {
        self.hits = Some(hits);
        self
    }

    pub fn normalize(&self, raw: &str) -> String {
        normalize_code(raw, self.ignore_case)
    }

    pub async fn resolve(&self, raw_code: &str) -> Result<Resolution> {
        let code = self.normalize(raw_code);
        if !is_valid_short_code(&code) {
            return Ok(Resolution::NotFound(NotFoundReason::Unknown));
        }

        match self.cache.get(&code) {
            CacheResult::Found(entry) => {
                if entry.is_expired(Utc::now()) {
                    trace!("Cached link '{}' has expired", code);
                    self.cache.invalidate(&code);
                    return Ok(Resolution::NotFound(NotFoundReason::Expired));
                }
                self.record_hit(&code);
                return Ok(Resolution::Redirect(entry.target));
            }
            CacheResult::NotFound => {
                trace!("Negative cache hit: {}", code);
                return Ok(Resolution::NotFound(NotFoundReason::Unknown));
            }
            CacheResult::Miss => {}
        }

        let link = self.load_through(&code).await?;
        let resolution = match link {
            Some(link) if link.state(Utc::now()) == LinkState::Active => {
                self.record_hit(&code);
                Resolution::Redirect(link.target)
            }
            Some(link) if link.disabled => Resolution::NotFound(NotFoundReason::Disabled),
            Some(_) => Resolution::NotFound(NotFoundReason::Expired),
            None => Resolution::NotFound(NotFoundReason::Unknown),
        };
        Ok(resolution)
    }

    /// 仅返回可用链接的公开信息，不计点击
    ///
    /// 与 `resolve` 一样优先使用缓存，存储故障时已缓存的链接仍可查询。
    pub async fn describe(&self, raw_code: &str) -> Result<Option<LinkInfo>> {
        let code = self.normalize(raw_code);
        if !is_valid_short_code(&code) {
            return Ok(None);
        }

        match self.cache.get(&code) {
            CacheResult::Found(entry) => {
                if entry.is_expired(Utc::now()) {
                    self.cache.invalidate(&code);
                    return Ok(None);
                }
                return Ok(Some(LinkInfo {
                    code: entry.code,
                    target: entry.target,
                    created_at: entry.created_at,
                    expires_at: entry.expires_at,
                }));
            }
            CacheResult::NotFound => return Ok(None),
            CacheResult::Miss => {}
        }

        let link = self.load_through(&code).await?;
        Ok(link
            .filter(|l| l.state(Utc::now()) == LinkState::Active)
            .map(|l| LinkInfo {
                code: l.code,
                target: l.target,
                created_at: l.created_at,
                expires_at: l.expires_at,
            }))
    }

    /// 回源读取并发布到缓存；存储故障或超时返回 `StoreUnavailable`
    async fn load_through(&self, code: &str) -> Result<Option<LinkMapping>> {
        let ticket = self.cache.begin_load(code);

        let link = match tokio::time::timeout(self.timeout, self.store.get(code)).await {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => {
                warn!("Store lookup for '{}' failed: {}", code, e);
                return Err(match e {
                    ShortlinkError::StoreUnavailable(_) => e,
                    other => ShortlinkError::store_unavailable(other.to_string()),
                });
            }
            Err(_) => {
                warn!(
                    "Store lookup for '{}' timed out after {:?}",
                    code, self.timeout
                );
                return Err(ShortlinkError::store_unavailable(format!(
                    "Lookup of '{}' timed out",
                    code
                )));
            }
        };

        let entry = link
            .as_ref()
            .filter(|l| l.state(Utc::now()) == LinkState::Active)
            .map(CacheEntry::from_mapping);
        if !self.cache.complete_load(ticket, entry) {
            debug!("Link '{}' changed during lookup, result not cached", code);
        }

        Ok(link)
    }

    fn record_hit(&self, code: &str) {
        if let Some(hits) = &self.hits {
            hits.increment(code);
        }
    }
}
