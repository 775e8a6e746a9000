//! Server mode
//!
//! 组装路由并启动 HTTP 服务。路由注册顺序：管理 API、健康检查、
//! 最后是兜底的重定向路由。

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api::middleware::{ApiKeyAuth, RequestIdMiddleware, TimingMiddleware};
use crate::api::services::{
    AppStartTime, health_routes, json_error_handler, links_routes, query_error_handler,
    redirect_routes,
};
use crate::cache::CompositeCacheTrait;
use crate::config::StaticConfig;
use crate::hits::HitCounter;
use crate::runtime::lifetime;
use crate::services::{LinkService, Resolver};
use crate::storage::LinkStore;

/// 请求体上限
const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// 所有 worker 共享的服务句柄
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn LinkStore>,
    pub cache: Arc<dyn CompositeCacheTrait>,
    pub link_service: Arc<LinkService>,
    pub resolver: Arc<Resolver>,
    pub hits: Option<HitCounter>,
    pub start_time: AppStartTime,
}

/// 注册 app data 与全部路由
///
/// 不包含外层中间件（request id、timing、compress），方便测试直接挂载。
pub fn configure_app(cfg: &mut web::ServiceConfig, services: &AppServices, config: &StaticConfig) {
    cfg.app_data(web::Data::new(services.store.clone()))
        .app_data(web::Data::new(services.cache.clone()))
        .app_data(web::Data::new(services.link_service.clone()))
        .app_data(web::Data::new(services.resolver.clone()))
        .app_data(web::Data::new(config.routing.clone()))
        .app_data(web::Data::new(services.start_time.clone()))
        .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .app_data(
            web::JsonConfig::default()
                .limit(MAX_PAYLOAD_BYTES)
                .error_handler(json_error_handler),
        )
        .app_data(web::QueryConfig::default().error_handler(query_error_handler));

    if let Some(hits) = &services.hits {
        cfg.app_data(web::Data::new(hits.clone()));
    }

    cfg.service(
        web::scope(&config.routing.api_prefix)
            .wrap(ApiKeyAuth::new(config.auth.clone()))
            .service(links_routes()),
    )
    .service(web::scope(&config.routing.health_prefix).service(health_routes()))
    .service(redirect_routes());
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let services = AppServices {
        store: startup.store.clone(),
        cache: startup.cache.clone(),
        link_service: startup.link_service.clone(),
        resolver: startup.resolver.clone(),
        hits: startup.hits.clone(),
        start_time,
    };

    if config.auth.admin_key.as_deref().is_none_or(str::is_empty) && config.auth.api_keys.is_empty()
    {
        warn!("No API keys configured, the management API is disabled");
    }

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let request_timeout = Duration::from_millis(config.server.request_timeout_ms.max(1));
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let app_config = Arc::clone(&config);
    let server = HttpServer::new(move || {
        let services = services.clone();
        let app_config = Arc::clone(&app_config);
        App::new()
            .wrap(TimingMiddleware) // 最外层，记录请求延迟
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .configure(move |cfg| configure_app(cfg, &services, &app_config))
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(request_timeout)
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count);

    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .disable_signals()
        .run();
    let handle = server.handle();

    tokio::select! {
        res = server => {
            res.context("HTTP server terminated with error")?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(startup.hits.clone()) => {
            handle.stop(true).await;
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
