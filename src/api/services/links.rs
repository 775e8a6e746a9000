//! 链接管理端点
//!
//! 所有端点都在 [`ApiKeyAuth`](crate::api::middleware::ApiKeyAuth) 之后，
//! 调用方身份从 request extensions 中取出。

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::trace;

use crate::services::{CreateLinkRequest, LinkService, Requester, UpdateLinkRequest};

use super::helpers::{api_result, created_response, error_from_shortlink};
use super::types::{LinkResponse, ListQuery, PaginatedLinks};

pub async fn create_link(
    requester: web::ReqData<Requester>,
    body: web::Json<CreateLinkRequest>,
    service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    let mut req = body.into_inner();
    // 普通调用方只能为自己创建；管理员可以指定所有者
    if let Requester::Owner(owner) = requester.into_inner() {
        req.owner = Some(owner);
    }

    match service.create_link(req).await {
        Ok(link) => created_response(LinkResponse::from(link)),
        Err(e) => error_from_shortlink(&e),
    }
}

pub async fn list_links(
    requester: web::ReqData<Requester>,
    query: web::Query<ListQuery>,
    service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    trace!("Listing links: page={}, page_size={}", query.page, query.page_size);
    api_result(
        service
            .list_links(&requester, query.page, query.page_size)
            .await
            .map(PaginatedLinks::from),
    )
}

pub async fn get_link(
    requester: web::ReqData<Requester>,
    path: web::Path<String>,
    service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    api_result(
        service
            .get_link(&path, &requester)
            .await
            .map(LinkResponse::from),
    )
}

pub async fn update_link(
    requester: web::ReqData<Requester>,
    path: web::Path<String>,
    body: web::Json<UpdateLinkRequest>,
    service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    api_result(
        service
            .update_link(&path, &requester, body.into_inner())
            .await
            .map(LinkResponse::from),
    )
}

pub async fn disable_link(
    requester: web::ReqData<Requester>,
    path: web::Path<String>,
    service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    api_result(
        service
            .disable_link(&path, &requester)
            .await
            .map(LinkResponse::from),
    )
}

pub async fn enable_link(
    requester: web::ReqData<Requester>,
    path: web::Path<String>,
    service: web::Data<Arc<LinkService>>,
) -> impl Responder {
    api_result(
        service
            .enable_link(&path, &requester)
            .await
            .map(LinkResponse::from),
    )
}

/// 链接管理路由 `/links`
///
/// - GET /links - 当前调用方的链接（管理员为全部）
/// - POST /links - 创建链接
/// - GET /links/{code} - 获取单个链接
/// - PATCH /links/{code} - 更新目标地址或过期时间
/// - DELETE /links/{code} - 禁用（软删除）
/// - POST /links/{code}/disable, /links/{code}/enable
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(list_links))
        .route("", web::post().to(create_link))
        .route("/{code}/disable", web::post().to(disable_link))
        .route("/{code}/enable", web::post().to(enable_link))
        .route("/{code}", web::get().to(get_link))
        .route("/{code}", web::patch().to(update_link))
        .route("/{code}", web::delete().to(disable_link))
}
