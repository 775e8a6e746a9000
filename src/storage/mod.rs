use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{LinkMapping, LinkPage, LinkPatch, LinkState};

/// 映射存储
///
/// 存储只负责持久化，`get` 无论链接是否过期或禁用都原样返回，
/// 状态判断由解析引擎负责。
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 按短码查询，不存在时返回 `Ok(None)`
    async fn get(&self, code: &str) -> Result<Option<LinkMapping>>;

    /// 仅创建；短码已存在时返回 `Conflict`
    async fn insert(&self, link: &LinkMapping) -> Result<()>;

    /// 部分更新，短码不存在时返回 `NotFound`
    async fn update(&self, code: &str, patch: &LinkPatch) -> Result<LinkMapping>;

    async fn set_disabled(&self, code: &str, disabled: bool) -> Result<LinkMapping>;

    async fn count(&self) -> Result<u64>;

    /// 最近创建的可用链接（用于缓存预热）
    async fn load_active(&self, limit: u64) -> Result<Vec<LinkMapping>>;

    async fn list_by_owner(
        &self,
        owner: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<LinkPage>;

    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &str;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let database_url = &config.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = backend::SeaOrmStorage::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(storage))
    }
}
