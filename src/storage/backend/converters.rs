use crate::storage::LinkMapping;
use migration::entities::short_link;

/// 将 Sea-ORM Model 转换为 LinkMapping
pub fn model_to_mapping(model: short_link::Model) -> LinkMapping {
    LinkMapping {
        code: model.short_code,
        target: model.target_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
        expires_at: model.expires_at,
        owner: model.owner,
        disabled: model.disabled,
        hit_count: model.hit_count.max(0) as u64,
    }
}

/// 将 LinkMapping 转换为用于插入的 ActiveModel
///
/// 新链接的点击数总是从 0 开始，由点击计数器异步累加。
pub fn mapping_to_active_model(link: &LinkMapping) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    short_link::ActiveModel {
        short_code: Set(link.code.clone()),
        target_url: Set(link.target.clone()),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
        expires_at: Set(link.expires_at),
        owner: Set(link.owner.clone()),
        disabled: Set(link.disabled),
        hit_count: Set(0),
    }
}
