use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, SqlErr};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::mapping_to_active_model;
use super::retry;
use crate::errors::{Result, ShortlinkError};
use crate::storage::models::{LinkMapping, LinkPatch};

use migration::entities::short_link;

/// 判断是否为唯一约束冲突（主键重复）
fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    // 回退到字符串匹配
    let msg = err.to_string().to_lowercase();
    msg.contains("unique constraint failed")
        || msg.contains("duplicate entry")
        || msg.contains("duplicate key value")
}

impl SeaOrmStorage {
    /// 原子创建；同一短码的并发创建由主键约束保证只有一个成功
    pub(super) async fn create(&self, link: &LinkMapping) -> Result<()> {
        let db = &self.db;
        let model = mapping_to_active_model(link);

        retry::with_retry_timeout(
            &format!("insert({})", link.code),
            self.retry_config,
            self.op_timeout_ms,
            || async {
                short_link::Entity::insert(model.clone())
                    .exec_without_returning(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                debug!("Insert conflict for short code '{}'", link.code);
                ShortlinkError::conflict(format!("Short code '{}' already exists", link.code))
            } else {
                ShortlinkError::from(e)
            }
        })?;

        info!(
            "Link created in {} storage: {}",
            self.backend_name.to_uppercase(),
            link.code
        );
        Ok(())
    }

    pub(super) async fn apply_patch(&self, code: &str, patch: &LinkPatch) -> Result<LinkMapping> {
        let mut update = short_link::Entity::update_many()
            .col_expr(short_link::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(short_link::Column::ShortCode.eq(code));

        if let Some(target) = &patch.target {
            update = update.col_expr(short_link::Column::TargetUrl, Expr::value(target.clone()));
        }
        if let Some(expires_at) = patch.expires_at {
            update = update.col_expr(short_link::Column::ExpiresAt, Expr::value(expires_at));
        }

        let db = &self.db;
        let result = retry::with_retry_timeout(
            &format!("update({})", code),
            self.retry_config,
            self.op_timeout_ms,
            || async { update.clone().exec(db).await },
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(ShortlinkError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        self.reload_after_write(code).await
    }

    pub(super) async fn toggle_disabled(&self, code: &str, disabled: bool) -> Result<LinkMapping> {
        let update = short_link::Entity::update_many()
            .col_expr(short_link::Column::Disabled, Expr::value(disabled))
            .col_expr(short_link::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(short_link::Column::ShortCode.eq(code));

        let db = &self.db;
        let result = retry::with_retry_timeout(
            &format!("set_disabled({})", code),
            self.retry_config,
            self.op_timeout_ms,
            || async { update.clone().exec(db).await },
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(ShortlinkError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        info!(
            "Link {} in {} storage: {}",
            if disabled { "disabled" } else { "enabled" },
            self.backend_name.to_uppercase(),
            code
        );
        self.reload_after_write(code).await
    }

    /// 写入后回读最新状态
    async fn reload_after_write(&self, code: &str) -> Result<LinkMapping> {
        self.find(code).await?.ok_or_else(|| {
            ShortlinkError::not_found(format!("Short code '{}' not found", code))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_message_fallback() {
        let err = DbErr::Exec(sea_orm::error::RuntimeErr::Internal(
            "UNIQUE constraint failed: short_links.short_code".to_string(),
        ));
        assert!(is_unique_violation(&err));

        let err = DbErr::Exec(sea_orm::error::RuntimeErr::Internal(
            "database is locked".to_string(),
        ));
        assert!(!is_unique_violation(&err));
    }
}
