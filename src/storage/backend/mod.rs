//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod hit_sink;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShortlinkError};
use crate::storage::LinkStore;
use crate::storage::models::{LinkMapping, LinkPage, LinkPatch};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{mapping_to_active_model, model_to_mapping};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ShortlinkError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 裸文件路径补全为 sqlite:// URL
fn normalize_sqlite_url(database_url: &str) -> String {
    if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else if database_url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}", database_url)
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
    /// 单次操作超时（毫秒）
    op_timeout_ms: u64,
}

impl SeaOrmStorage {
    pub async fn new(
        database_url: &str,
        backend_name: &str,
        config: &DatabaseConfig,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortlinkError::database_config("DATABASE_URL is not set"));
        }

        let retry_config = retry::RetryConfig::from(config);

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(&normalize_sqlite_url(database_url)).await?
        } else {
            connect_generic(database_url, backend_name, config).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
            op_timeout_ms: config.operation_timeout_ms.max(1),
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

}

#[async_trait]
impl LinkStore for SeaOrmStorage {
    async fn get(&self, code: &str) -> Result<Option<LinkMapping>> {
        self.find(code).await
    }

    async fn insert(&self, link: &LinkMapping) -> Result<()> {
        self.create(link).await
    }

    async fn update(&self, code: &str, patch: &LinkPatch) -> Result<LinkMapping> {
        self.apply_patch(code, patch).await
    }

    async fn set_disabled(&self, code: &str, disabled: bool) -> Result<LinkMapping> {
        self.toggle_disabled(code, disabled).await
    }

    async fn count(&self) -> Result<u64> {
        self.count_all().await
    }

    async fn load_active(&self, limit: u64) -> Result<Vec<LinkMapping>> {
        self.recent_active(limit).await
    }

    async fn list_by_owner(
        &self,
        owner: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<LinkPage> {
        self.paginate_by_owner(owner, page, page_size).await
    }

    async fn ping(&self) -> Result<()> {
        let db = &self.db;
        retry::with_retry_timeout("ping", self.retry_config, self.op_timeout_ms, || async {
            db.ping().await
        })
        .await
        .map_err(ShortlinkError::from)
    }

    fn backend_name(&self) -> &str {
        &self.backend_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://links.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("links.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/db").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://localhost/db").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_normalize_sqlite_url() {
        assert_eq!(normalize_sqlite_url("links.db"), "sqlite://links.db");
        assert_eq!(
            normalize_sqlite_url("sqlite://links.db?mode=rwc"),
            "sqlite://links.db?mode=rwc"
        );
        assert_eq!(normalize_sqlite_url(":memory:"), "sqlite::memory:");
    }
}
