use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 短码到目标地址的持久映射
///
/// 短码一经分配不可变更，也不会被物理删除；禁用是软删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMapping {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub hit_count: u64,
}

/// 链接在某一时刻的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Active,
    Expired,
    Disabled,
}

impl LinkMapping {
    pub fn new(code: impl Into<String>, target: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            code: code.into(),
            target: target.into(),
            created_at: now,
            updated_at: now,
            expires_at: None,
            owner: None,
            disabled: false,
            hit_count: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// 禁用优先于过期
    pub fn state(&self, now: DateTime<Utc>) -> LinkState {
        if self.disabled {
            LinkState::Disabled
        } else if self.is_expired(now) {
            LinkState::Expired
        } else {
            LinkState::Active
        }
    }
}

/// 对已有链接的部分更新
///
/// `expires_at` 为 `Some(None)` 时清除过期时间。
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub target: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.expires_at.is_none()
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct LinkPage {
    pub items: Vec<LinkMapping>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
