use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::model_to_mapping;
use super::retry;
use crate::errors::Result;
use crate::storage::models::{LinkMapping, LinkPage};

use migration::entities::short_link;

/// 单页最大条数
const MAX_PAGE_SIZE: u64 = 200;

impl SeaOrmStorage {
    pub(super) async fn find(&self, code: &str) -> Result<Option<LinkMapping>> {
        let db = &self.db;
        let model = retry::with_retry_timeout(
            &format!("get({})", code),
            self.retry_config,
            self.op_timeout_ms,
            || async { short_link::Entity::find_by_id(code).one(db).await },
        )
        .await?;

        Ok(model.map(model_to_mapping))
    }

    pub(super) async fn count_all(&self) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry_timeout(
            "count",
            self.retry_config,
            self.op_timeout_ms,
            || async { short_link::Entity::find().count(db).await },
        )
        .await?;

        Ok(count)
    }

    /// 最近创建的、未禁用且未过期的链接
    pub(super) async fn recent_active(&self, limit: u64) -> Result<Vec<LinkMapping>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let db = &self.db;
        let now = chrono::Utc::now();
        let models = retry::with_retry_timeout(
            "load_active",
            self.retry_config,
            self.op_timeout_ms,
            || async {
                short_link::Entity::find()
                    .filter(short_link::Column::Disabled.eq(false))
                    .filter(
                        Condition::any()
                            .add(short_link::Column::ExpiresAt.is_null())
                            .add(short_link::Column::ExpiresAt.gt(now)),
                    )
                    .order_by_desc(short_link::Column::CreatedAt)
                    .limit(limit)
                    .all(db)
                    .await
            },
        )
        .await?;

        debug!("Loaded {} active links", models.len());
        Ok(models.into_iter().map(model_to_mapping).collect())
    }

    /// 分页列出链接；`owner` 为 None 时列出全部
    pub(super) async fn paginate_by_owner(
        &self,
        owner: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<LinkPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let db = &self.db;

        let (total, models) = retry::with_retry_timeout(
            "list_by_owner",
            self.retry_config,
            self.op_timeout_ms,
            || async {
                let mut select = short_link::Entity::find();
                if let Some(owner) = owner {
                    select = select.filter(short_link::Column::Owner.eq(owner));
                }
                let paginator = select
                    .order_by_desc(short_link::Column::CreatedAt)
                    .order_by_asc(short_link::Column::ShortCode)
                    .paginate(db, page_size);

                let total = paginator.num_items().await?;
                let models = paginator.fetch_page(page - 1).await?;
                Ok((total, models))
            },
        )
        .await?;

        Ok(LinkPage {
            items: models.into_iter().map(model_to_mapping).collect(),
            total,
            page,
            page_size,
        })
    }
}
