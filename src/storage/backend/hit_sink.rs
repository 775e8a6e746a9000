//! HitSink implementation for SeaOrmStorage
//!
//! Flushes buffered hit counts with a single `UPDATE ... SET hit_count = CASE ...`
//! statement. Values are bound as parameters; short codes are additionally
//! checked against the short code charset before the statement is built.

use async_trait::async_trait;
use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ConnectionTrait, ExprTrait};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::hits::HitSink;
use crate::utils::is_valid_short_code;

use migration::entities::short_link;

#[async_trait]
impl HitSink for SeaOrmStorage {
    async fn flush_hits(&self, updates: Vec<(String, usize)>) -> anyhow::Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        if let Some((code, _)) = updates.iter().find(|(code, _)| !is_valid_short_code(code)) {
            return Err(anyhow::anyhow!(
                "Invalid short_code format detected: '{}' - refusing to execute SQL",
                code
            ));
        }

        let total_count = updates.len();

        // 构建 CASE WHEN 表达式（跨数据库兼容）
        let mut case_stmt = CaseStatement::new();
        let mut codes: Vec<String> = Vec::with_capacity(total_count);
        for (code, count) in &updates {
            case_stmt = case_stmt.case(
                Expr::col(short_link::Column::ShortCode).eq(Expr::val(code.as_str())),
                Expr::col(short_link::Column::HitCount).add(Expr::val(*count as i64)),
            );
            codes.push(code.clone());
        }
        // 不匹配的保持原值
        case_stmt = case_stmt.finally(Expr::col(short_link::Column::HitCount));

        let stmt = Query::update()
            .table(short_link::Entity)
            .value(short_link::Column::HitCount, case_stmt)
            .and_where(Expr::col(short_link::Column::ShortCode).is_in(codes))
            .to_owned();

        let db = &self.db;
        let stmt_ref = &stmt;
        retry::with_retry_timeout("flush_hits", self.retry_config, self.op_timeout_ms, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to batch update hit counts: {}", e))?;

        debug!(
            "Hit counts flushed to {} database ({} records)",
            self.backend_name.to_uppercase(),
            total_count
        );

        Ok(())
    }
}
