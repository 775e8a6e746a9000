//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::ShortlinkError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 ShortlinkError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_shortlink(err: &ShortlinkError) -> HttpResponse {
    error_response(err.http_status(), ErrorCode::from(err), err.message())
}

/// 成功时返回 200 + JSON 数据，失败时映射 ShortlinkError
pub fn api_result<T: Serialize>(result: Result<T, ShortlinkError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_shortlink(&e),
    }
}

/// 请求体/查询参数解析失败时同样返回信封格式
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    let message = format!("Invalid request body: {}", err);
    actix_web::error::InternalError::from_response(
        err,
        error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message),
    )
    .into()
}

pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    let message = format!("Invalid query string: {}", err);
    actix_web::error::InternalError::from_response(
        err,
        error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message),
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_shortlink_status() {
        let resp = error_from_shortlink(&ShortlinkError::conflict("taken"));
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = error_from_shortlink(&ShortlinkError::forbidden("nope"));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_created_response() {
        let resp = created_response("x");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
