//! API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheHealthStatus;
use crate::storage::{LinkMapping, LinkPage, LinkState};

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

/// 链接的完整视图（仅所有者与管理员可见）
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LinkResponse {
    pub code: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    pub state: LinkState,
    pub hit_count: u64,
}

impl From<LinkMapping> for LinkResponse {
    fn from(link: LinkMapping) -> Self {
        let state = link.state(Utc::now());
        Self {
            code: link.code,
            target_url: link.target,
            created_at: link.created_at,
            updated_at: link.updated_at,
            expires_at: link.expires_at,
            owner: link.owner,
            state,
            hit_count: link.hit_count,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedLinks {
    pub items: Vec<LinkResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl From<LinkPage> for PaginatedLinks {
    fn from(page: LinkPage) -> Self {
        Self {
            items: page.items.into_iter().map(LinkResponse::from).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

// ============ Health ============

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    pub links_count: Option<u64>,
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
    pub cache: CacheHealthStatus,
    pub buffered_hits: Option<usize>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub uptime_human: String,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}
