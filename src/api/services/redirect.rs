use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, Responder, web};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use xxhash_rust::xxh64::xxh64;

use crate::config::RoutingConfig;
use crate::services::{Resolution, Resolver};

use super::helpers::{error_response, success_response};
use super::error_code::ErrorCode;

/// 查看链接信息的路径后缀：`/{code}+`
const INFO_SUFFIX: char = '+';

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

pub struct RedirectService;

impl RedirectService {
    fn handle_root(routing: &RoutingConfig) -> HttpResponse {
        match routing.root_redirect.as_deref().filter(|u| !u.is_empty()) {
            Some(target) => {
                let mut resp = HttpResponse::TemporaryRedirect();
                Self::apply_server_header(&mut resp, routing);
                resp.insert_header((header::LOCATION, target)).finish()
            }
            None => Self::not_found_response(routing),
        }
    }

    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        resolver: web::Data<Arc<Resolver>>,
        routing: web::Data<RoutingConfig>,
    ) -> impl Responder {
        let captured = path.into_inner();

        if captured.is_empty() {
            return Self::handle_root(&routing);
        }

        if routing.enable_info_request
            && let Some(code) = captured.strip_suffix(INFO_SUFFIX)
        {
            return Self::handle_info(code, &resolver, &routing).await;
        }

        match resolver.resolve(&captured).await {
            Ok(Resolution::Redirect(target)) => {
                let code = resolver.normalize(&captured);
                Self::finish_redirect(&req, &code, &target, &routing)
            }
            Ok(Resolution::NotFound(reason)) => {
                trace!("Short code '{}' not resolvable: {:?}", captured, reason);
                Self::not_found_response(&routing)
            }
            Err(e) => {
                warn!("Serving degraded 404 for '{}': {}", captured, e);
                Self::degraded_response(&routing)
            }
        }
    }

    pub async fn handle_options(routing: web::Data<RoutingConfig>) -> impl Responder {
        let mut resp = HttpResponse::Ok();
        Self::apply_server_header(&mut resp, &routing);
        resp.insert_header((header::ALLOW, ALLOWED_METHODS)).finish()
    }

    async fn handle_info(code: &str, resolver: &Resolver, routing: &RoutingConfig) -> HttpResponse {
        match resolver.describe(code).await {
            Ok(Some(info)) => success_response(info),
            Ok(None) => error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::LinkNotFound,
                "Link not found",
            ),
            Err(e) => {
                warn!("Info request for '{}' failed: {}", code, e);
                let mut resp = error_response(
                    StatusCode::NOT_FOUND,
                    ErrorCode::ServiceUnavailable,
                    "Link not found",
                );
                resp.headers_mut().insert(
                    header::HeaderName::from_static("x-degraded"),
                    HeaderValue::from_static("store-unavailable"),
                );
                if routing.show_server_header {
                    resp.headers_mut()
                        .insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
                }
                resp
            }
        }
    }

    /// 强校验 ETag：短码与目标地址的哈希
    pub fn compute_etag(code: &str, target: &str) -> String {
        let mut buf = Vec::with_capacity(code.len() + target.len() + 1);
        buf.extend_from_slice(code.as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(target.as_bytes());
        format!("\"{:016x}\"", xxh64(&buf, 0))
    }

    fn if_none_match(req: &HttpRequest, etag: &str) -> bool {
        req.headers()
            .get(header::IF_NONE_MATCH)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"))
    }

    fn finish_redirect(
        req: &HttpRequest,
        code: &str,
        target: &str,
        routing: &RoutingConfig,
    ) -> HttpResponse {
        let cache_control = format!("public, max-age={}", routing.http_cache_max_age);

        let etag = routing.use_etag.then(|| Self::compute_etag(code, target));
        if let Some(etag) = &etag
            && Self::if_none_match(req, etag)
        {
            debug!("ETag matched for '{}'", code);
            let mut resp = HttpResponse::NotModified();
            Self::apply_server_header(&mut resp, routing);
            return resp
                .insert_header((header::ETAG, etag.as_str()))
                .insert_header((header::CACHE_CONTROL, cache_control))
                .finish();
        }

        let mut resp = HttpResponse::TemporaryRedirect();
        Self::apply_server_header(&mut resp, routing);
        resp.insert_header((header::LOCATION, target))
            .insert_header((header::CACHE_CONTROL, cache_control));
        if let Some(etag) = etag {
            resp.insert_header((header::ETAG, etag));
        }
        resp.finish()
    }

    fn not_found_response(routing: &RoutingConfig) -> HttpResponse {
        let mut resp = HttpResponse::NotFound();
        Self::apply_server_header(&mut resp, routing);
        resp.insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
            .insert_header((header::CACHE_CONTROL, "no-cache"))
            .body("Not Found")
    }

    /// 存储不可用时的降级响应：仍然是 404，但带上标记头且禁止缓存
    fn degraded_response(routing: &RoutingConfig) -> HttpResponse {
        let mut resp = HttpResponse::NotFound();
        Self::apply_server_header(&mut resp, routing);
        resp.insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .insert_header(("X-Degraded", "store-unavailable"))
            .body("Not Found")
    }

    fn apply_server_header(resp: &mut HttpResponseBuilder, routing: &RoutingConfig) {
        if routing.show_server_header {
            resp.insert_header((header::SERVER, SERVER_NAME));
        }
    }
}

const SERVER_NAME: &str = concat!("go-short-link/", env!("CARGO_PKG_VERSION"));

/// 重定向路由，需注册在所有前缀路由之后
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{path}*", web::get().to(RedirectService::handle_redirect))
        .route("/{path}*", web::head().to(RedirectService::handle_redirect))
        .route(
            "/{path}*",
            web::method(actix_web::http::Method::OPTIONS).to(RedirectService::handle_options),
        )
}
