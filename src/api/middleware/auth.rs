use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, WWW_AUTHENTICATE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::api::services::error_from_shortlink;
use crate::config::AuthConfig;
use crate::errors::ShortlinkError;
use crate::services::Requester;

/// API Key 认证中间件
///
/// 从 `Authorization: Bearer <key>` 解析调用方身份并放入 request extensions，
/// 处理函数通过 `web::ReqData<Requester>` 取出。
#[derive(Clone)]
pub struct ApiKeyAuth {
    auth: Arc<AuthConfig>,
}

impl ApiKeyAuth {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth: Arc::new(auth),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            auth: Arc::clone(&self.auth),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    auth: Arc<AuthConfig>,
}

impl<S, B> ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// 未配置任何 Key 时 API 视为关闭
    fn handle_api_disabled(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        debug!("No API keys configured - returning 404");
        req.into_response(
            HttpResponse::NotFound()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body("Not Found")
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
        info!("API authentication failed: {}", message);
        let mut response = error_from_shortlink(&ShortlinkError::unauthorized(message));
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        req.into_response(response.map_into_right_body())
    }

    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
    }
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let auth = Arc::clone(&self.auth);

        Box::pin(async move {
            let no_admin = auth.admin_key.as_deref().is_none_or(str::is_empty);
            if no_admin && auth.api_keys.is_empty() {
                return Ok(Self::handle_api_disabled(req));
            }

            let Some(token) = Self::extract_bearer_token(&req) else {
                return Ok(Self::handle_unauthorized(req, "Missing bearer token"));
            };

            let Some(requester) = Requester::from_token(&token, &auth) else {
                return Ok(Self::handle_unauthorized(req, "Invalid API key"));
            };

            trace!("Authenticated request as '{}'", requester.display_name());
            req.extensions_mut().insert(requester);

            let res = srv.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
